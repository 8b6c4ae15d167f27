use bitflags::Flags;

use super::{FieldTable, Method};

bitflags! {
    #[derive(Clone, Debug)]
    pub struct ExchangeDeclareFlags: u8 {
        const PASSIVE = 0b00000001;
        const DURABLE = 0b00000010;
        const AUTO_DELETE = 0b00000100;
        const INTERNAL = 0b00001000;
        const NO_WAIT = 0b00010000;
    }
}

impl Default for ExchangeDeclareFlags {
    fn default() -> Self {
        ExchangeDeclareFlags::empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExchangeDeclareArgs {
    pub exchange_name: String,
    pub exchange_type: String,
    pub flags: ExchangeDeclareFlags,
    pub args: Option<FieldTable>,
}

impl ExchangeDeclareArgs {
    pub fn exchange_name(mut self, name: &str) -> Self {
        self.exchange_name = name.to_string();
        self
    }

    pub fn exchange_type(mut self, exchange_type: &str) -> Self {
        self.exchange_type = exchange_type.to_string();
        self
    }

    pub fn durable(mut self, mode: bool) -> Self {
        Flags::set(&mut self.flags, ExchangeDeclareFlags::DURABLE, mode);
        self
    }

    pub fn passive(mut self, mode: bool) -> Self {
        Flags::set(&mut self.flags, ExchangeDeclareFlags::PASSIVE, mode);
        self
    }

    pub fn auto_delete(mut self, mode: bool) -> Self {
        Flags::set(&mut self.flags, ExchangeDeclareFlags::AUTO_DELETE, mode);
        self
    }

    pub fn method(self) -> Method {
        Method::ExchangeDeclare(self)
    }
}

bitflags! {
    #[derive(Clone, Debug)]
    pub struct ExchangeDeleteFlags: u8 {
        const IF_UNUSED = 0b00000001;
        const NO_WAIT = 0b00000010;
    }
}

impl Default for ExchangeDeleteFlags {
    fn default() -> Self {
        ExchangeDeleteFlags::empty()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExchangeDeleteArgs {
    pub exchange_name: String,
    pub flags: ExchangeDeleteFlags,
}

impl ExchangeDeleteArgs {
    pub fn exchange_name(mut self, name: &str) -> Self {
        self.exchange_name = name.to_string();
        self
    }

    pub fn if_unused(mut self, mode: bool) -> Self {
        Flags::set(&mut self.flags, ExchangeDeleteFlags::IF_UNUSED, mode);
        self
    }

    pub fn method(self) -> Method {
        Method::ExchangeDelete(self)
    }
}
