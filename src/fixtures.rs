#[cfg(test)]
pub mod test {
    use std::time::Duration;

    use crate::schema::{Record, RecordType};

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct SingleString {
        pub value: String,
    }

    impl Record for SingleString {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Value", "VALUE,parser=nonempty-string", |s| &mut s.value)
                .build()
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct WithDefault {
        pub value: String,
    }

    impl Record for WithDefault {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field(
                    "Value",
                    "VALUE,parser=nonempty-string,default=str",
                    |s| &mut s.value,
                )
                .build()
        }
    }

    /// A typical service record: one required field, the rest with fallbacks.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Server {
        pub host: String,
        pub port: u16,
        pub public_host: String,
        pub timeout: Duration,
    }

    impl Record for Server {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Host", "HOST,parser=nonempty-string", |s| &mut s.host)
                .field("Port", "PORT,parser=parse-int,default=8080", |s| &mut s.port)
                .field(
                    "PublicHost",
                    "PUBLIC_HOST,parser=nonempty-string,defaultFrom=Host",
                    |s| &mut s.public_host,
                )
                .field(
                    "Timeout",
                    "TIMEOUT,parser=integer-seconds,default=30",
                    |s| &mut s.timeout,
                )
                .build()
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Listed {
        pub peers: Vec<String>,
    }

    impl Record for Listed {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Peers", "PEERS,parser=comma-list,default=a,b,c", |s| {
                    &mut s.peers
                })
                .build()
        }
    }

    // -- Nested records ---------------------------------------------------------

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Nested {
        pub parent: String,
        pub child: Child,
    }

    impl Record for Nested {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Parent", "PARENT,parser=nonempty-string", |s| &mut s.parent)
                .record("Child", "", |s| &mut s.child)
                .build()
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Child {
        pub thing: String,
    }

    impl Record for Child {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Thing", "CHILD,parser=nonempty-string", |s| &mut s.thing)
                .build()
        }
    }

    /// Declares `Child` as a plain field, so it is a leaf when a handler exists.
    #[derive(Debug, Default, Clone)]
    pub struct AsLeaf {
        pub child: Child,
    }

    impl Record for AsLeaf {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Child", "CHILD,parser=whole", |s| &mut s.child)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct Shadowed {
        pub value: String,
        pub inner: SingleString,
    }

    impl Record for Shadowed {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Value", "OUTER,parser=nonempty-string", |s| &mut s.value)
                .record("Inner", "", |s| &mut s.inner)
                .build()
        }
    }

    // -- Records that must not compile ------------------------------------------

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub struct Ratio(pub f32);

    #[derive(Debug, Default, Clone)]
    pub struct Unsupported {
        pub ratio: Ratio,
    }

    impl Record for Unsupported {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Ratio", "RATIO,parser=parse-float", |s| &mut s.ratio)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct TaggedChild {
        pub child: Child,
    }

    impl Record for TaggedChild {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .record("Child", "CHILD", |s| &mut s.child)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct NoParser {
        pub value: String,
    }

    impl Record for NoParser {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Value", "VALUE", |s| &mut s.value)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct BrokenParent {
        pub inner: NoParser,
    }

    impl Record for BrokenParent {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .record("Inner", "", |s| &mut s.inner)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct UnknownParser {
        pub value: String,
    }

    impl Record for UnknownParser {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Value", "VALUE,parser=bogus", |s| &mut s.value)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct BothDefaults {
        pub host: String,
        pub copy: String,
    }

    impl Record for BothDefaults {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Host", "HOST,parser=nonempty-string", |s| &mut s.host)
                .field(
                    "Copy",
                    "COPY,parser=nonempty-string,defaultFrom=Host,default=x",
                    |s| &mut s.copy,
                )
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct BadDefault {
        pub port: u16,
    }

    impl Record for BadDefault {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Port", "PORT,parser=parse-int,default=eighty", |s| &mut s.port)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct ForwardRef {
        pub early: String,
        pub late: String,
    }

    impl Record for ForwardRef {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field(
                    "Early",
                    "EARLY,parser=nonempty-string,defaultFrom=Late",
                    |s| &mut s.early,
                )
                .field("Late", "LATE,parser=nonempty-string", |s| &mut s.late)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct MistypedRef {
        pub port: u16,
        pub host: String,
    }

    impl Record for MistypedRef {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Port", "PORT,parser=parse-int", |s| &mut s.port)
                .field(
                    "Host",
                    "HOST,parser=nonempty-string,defaultFrom=Port",
                    |s| &mut s.host,
                )
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct Unnamed {
        pub value: String,
    }

    impl Record for Unnamed {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Value", ",parser=nonempty-string", |s| &mut s.value)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct NamedConst {
        pub value: String,
    }

    impl Record for NamedConst {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field(
                    "Value",
                    "VALUE,const=true,parser=nonempty-string,default=x",
                    |s| &mut s.value,
                )
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct Constant {
        pub version: String,
    }

    impl Record for Constant {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field(
                    "Version",
                    ",const=true,parser=nonempty-string,default=v1",
                    |s| &mut s.version,
                )
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct Duplicated {
        pub a: String,
        pub b: String,
    }

    impl Record for Duplicated {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Value", "A,parser=nonempty-string", |s| &mut s.a)
                .field("Value", "B,parser=nonempty-string", |s| &mut s.b)
                .build()
        }
    }

    #[derive(Debug, Default, Clone)]
    pub struct Malformed {
        pub value: String,
    }

    impl Record for Malformed {
        fn record_type() -> RecordType {
            RecordType::builder::<Self>()
                .field("Value", "VALUE,parser", |s| &mut s.value)
                .build()
        }
    }

    /// Hands out another record's description.
    #[derive(Debug, Default, Clone)]
    pub struct Impostor;

    impl Record for Impostor {
        fn record_type() -> RecordType {
            SingleString::record_type()
        }
    }

    #[test]
    fn fixtures_describe_themselves() {
        let server = RecordType::of::<Server>();
        let names: Vec<&str> = server.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["Host", "Port", "PublicHost", "Timeout"]);
        assert_eq!(
            server.field("Port").unwrap().tag(),
            "PORT,parser=parse-int,default=8080"
        );
    }
}
