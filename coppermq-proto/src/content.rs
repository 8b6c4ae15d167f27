use std::collections::HashMap;

/// The (properties, payload) body attached to content-bearing methods.
#[derive(Clone, Default)]
pub struct Content {
    pub properties: MessageProperties,
    pub body: Vec<u8>,
}

impl Content {
    pub fn from_body(body: Vec<u8>) -> Self {
        Self {
            properties: MessageProperties::default(),
            body,
        }
    }

    pub fn body_size(&self) -> usize {
        self.body.len()
    }
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = String::from_utf8_lossy(&self.body[..std::cmp::min(64usize, self.body.len())]);

        f.write_fmt(format_args!(
            "Content {{ size: {}, body: \"{}\" }}",
            self.body.len(),
            body
        ))
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::from_body(value.as_bytes().to_vec())
    }
}

/// Standard set of message properties
#[derive(Clone, Debug, Default)]
pub struct MessageProperties {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub headers: HashMap<String, String>,
    /// 1 - non-persistent, 2 - persistent
    pub delivery_mode: Option<u8>,
    pub priority: Option<u8>,
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    pub expiration: Option<String>,
    pub message_id: Option<String>,
    pub timestamp: Option<u64>,
    pub message_type: Option<String>,
    pub user_id: Option<String>,
    pub app_id: Option<String>,
}
