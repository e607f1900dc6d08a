use std::time::Duration;

use envfig::{Record, RecordType};

/// Top-level demo configuration.
#[derive(Debug, Default, Clone)]
pub struct DemoConfig {
    pub log_level: String,
    pub server: ServerConfig,
    pub peers: Vec<String>,
    pub upstream: Option<url::Url>,
    pub build: String,
}

impl Record for DemoConfig {
    fn record_type() -> RecordType {
        RecordType::builder::<Self>()
            .field(
                "LogLevel",
                "DEMO_LOG_LEVEL,parser=log-level,default=info",
                |c| &mut c.log_level,
            )
            .record("Server", "", |c| &mut c.server)
            .field(
                "Peers",
                "DEMO_PEERS,parser=comma-list,default=alpha.internal, beta.internal",
                |c| &mut c.peers,
            )
            .field("Upstream", "DEMO_UPSTREAM,parser=absolute-URL", |c| {
                &mut c.upstream
            })
            .field(
                "Build",
                ",const=true,parser=nonempty-string,default=demo",
                |c| &mut c.build,
            )
            .build()
    }
}

/// Listener settings.
#[derive(Debug, Default, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub public_host: String,
    pub timeout: Duration,
    pub tls: bool,
}

impl Record for ServerConfig {
    fn record_type() -> RecordType {
        RecordType::builder::<Self>()
            .field(
                "Host",
                "DEMO_HOST,parser=nonempty-string,default=127.0.0.1",
                |s| &mut s.host,
            )
            .field("Port", "DEMO_PORT,parser=parse-int,default=8080", |s| {
                &mut s.port
            })
            .field(
                "PublicHost",
                "DEMO_PUBLIC_HOST,parser=nonempty-string,defaultFrom=Host",
                |s| &mut s.public_host,
            )
            .field(
                "Timeout",
                "DEMO_TIMEOUT,parser=integer-seconds,default=30",
                |s| &mut s.timeout,
            )
            .field("Tls", "DEMO_TLS,parser=parse-bool,default=false", |s| {
                &mut s.tls
            })
            .build()
    }
}
