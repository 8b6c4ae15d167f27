use super::{FieldTable, Method};

#[derive(Clone, Debug)]
pub struct ConnectionStartArgs {
    pub version_major: u8,
    pub version_minor: u8,
    pub properties: Option<FieldTable>,
    pub mechanisms: String,
    pub locales: String,
}

impl Default for ConnectionStartArgs {
    fn default() -> Self {
        Self {
            version_major: 0,
            version_minor: 9,
            properties: None,
            mechanisms: "PLAIN".to_string(),
            locales: "en_US".to_string(),
        }
    }
}

impl ConnectionStartArgs {
    pub fn method(self) -> Method {
        Method::ConnectionStart(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConnectionStartOkArgs {
    pub properties: Option<FieldTable>,
    pub mechanism: String,
    pub response: String,
    pub locale: String,
}

impl ConnectionStartOkArgs {
    pub fn method(self) -> Method {
        Method::ConnectionStartOk(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConnectionTuneArgs {
    pub channel_max: u16,
    pub frame_max: u32,
    pub heartbeat: u16,
}

impl ConnectionTuneArgs {
    pub fn method(self) -> Method {
        Method::ConnectionTune(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConnectionTuneOkArgs {
    pub channel_max: u16,
    pub frame_max: u32,
    pub heartbeat: u16,
}

impl ConnectionTuneOkArgs {
    pub fn method(self) -> Method {
        Method::ConnectionTuneOk(self)
    }
}

#[derive(Clone, Debug)]
pub struct ConnectionOpenArgs {
    pub virtual_host: String,
    pub insist: bool,
}

impl Default for ConnectionOpenArgs {
    fn default() -> Self {
        Self {
            virtual_host: "/".to_string(),
            insist: false,
        }
    }
}

impl ConnectionOpenArgs {
    pub fn virtual_host(mut self, virtual_host: &str) -> Self {
        self.virtual_host = virtual_host.to_string();
        self
    }

    pub fn method(self) -> Method {
        Method::ConnectionOpen(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConnectionCloseArgs {
    pub code: u16,
    pub text: String,
    pub class_id: u16,
    pub method_id: u16,
}

impl ConnectionCloseArgs {
    pub fn method(self) -> Method {
        Method::ConnectionClose(self)
    }
}
