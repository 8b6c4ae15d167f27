use bitflags::Flags;

use super::{FieldTable, Method};

bitflags! {
    #[derive(Clone, Debug)]
    pub struct QueueDeclareFlags: u8 {
        const PASSIVE = 0b00000001;
        const DURABLE = 0b00000010;
        const EXCLUSIVE = 0b00000100;
        const AUTO_DELETE = 0b00001000;
        const NO_WAIT = 0b00010000;
    }
}

impl Default for QueueDeclareFlags {
    fn default() -> Self {
        QueueDeclareFlags::empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueueDeclareArgs {
    pub name: String,
    pub flags: QueueDeclareFlags,
    pub args: Option<FieldTable>,
}

impl QueueDeclareArgs {
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn durable(mut self, mode: bool) -> Self {
        Flags::set(&mut self.flags, QueueDeclareFlags::DURABLE, mode);
        self
    }

    pub fn exclusive(mut self, mode: bool) -> Self {
        Flags::set(&mut self.flags, QueueDeclareFlags::EXCLUSIVE, mode);
        self
    }

    pub fn auto_delete(mut self, mode: bool) -> Self {
        Flags::set(&mut self.flags, QueueDeclareFlags::AUTO_DELETE, mode);
        self
    }

    pub fn method(self) -> Method {
        Method::QueueDeclare(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueueDeclareOkArgs {
    pub name: String,
    pub message_count: u32,
    pub consumer_count: u32,
}

impl QueueDeclareOkArgs {
    pub fn method(self) -> Method {
        Method::QueueDeclareOk(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueueBindArgs {
    pub queue_name: String,
    pub exchange_name: String,
    pub routing_key: String,
    pub no_wait: bool,
    pub args: Option<FieldTable>,
}

impl QueueBindArgs {
    pub fn new(queue_name: &str, exchange_name: &str) -> Self {
        Self {
            queue_name: queue_name.to_string(),
            exchange_name: exchange_name.to_string(),
            ..Default::default()
        }
    }

    pub fn routing_key(mut self, routing_key: &str) -> Self {
        self.routing_key = routing_key.to_string();
        self
    }

    pub fn method(self) -> Method {
        Method::QueueBind(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueuePurgeArgs {
    pub queue_name: String,
    pub no_wait: bool,
}

impl QueuePurgeArgs {
    pub fn queue_name(mut self, name: &str) -> Self {
        self.queue_name = name.to_string();
        self
    }

    pub fn method(self) -> Method {
        Method::QueuePurge(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueuePurgeOkArgs {
    pub message_count: u32,
}

impl QueuePurgeOkArgs {
    pub fn method(self) -> Method {
        Method::QueuePurgeOk(self)
    }
}

bitflags! {
    #[derive(Clone, Debug)]
    pub struct QueueDeleteFlags: u8 {
        const IF_UNUSED = 0b00000001;
        const IF_EMPTY = 0b00000010;
        const NO_WAIT = 0b00000100;
    }
}

impl Default for QueueDeleteFlags {
    fn default() -> Self {
        QueueDeleteFlags::empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueueDeleteArgs {
    pub queue_name: String,
    pub flags: QueueDeleteFlags,
}

impl QueueDeleteArgs {
    pub fn queue_name(mut self, name: &str) -> Self {
        self.queue_name = name.to_string();
        self
    }

    pub fn if_unused(mut self, mode: bool) -> Self {
        Flags::set(&mut self.flags, QueueDeleteFlags::IF_UNUSED, mode);
        self
    }

    pub fn if_empty(mut self, mode: bool) -> Self {
        Flags::set(&mut self.flags, QueueDeleteFlags::IF_EMPTY, mode);
        self
    }

    pub fn method(self) -> Method {
        Method::QueueDelete(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueueDeleteOkArgs {
    pub message_count: u32,
}

impl QueueDeleteOkArgs {
    pub fn method(self) -> Method {
        Method::QueueDeleteOk(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct QueueUnbindArgs {
    pub queue_name: String,
    pub exchange_name: String,
    pub routing_key: String,
    pub args: Option<FieldTable>,
}

impl QueueUnbindArgs {
    pub fn new(queue_name: &str, exchange_name: &str) -> Self {
        Self {
            queue_name: queue_name.to_string(),
            exchange_name: exchange_name.to_string(),
            ..Default::default()
        }
    }

    pub fn routing_key(mut self, routing_key: &str) -> Self {
        self.routing_key = routing_key.to_string();
        self
    }

    pub fn method(self) -> Method {
        Method::QueueUnbind(self)
    }
}
