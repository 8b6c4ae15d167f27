use super::Method;

#[derive(Clone, Debug, Default)]
pub struct ChannelFlowArgs {
    pub active: bool,
}

impl ChannelFlowArgs {
    pub fn new(active: bool) -> Self {
        Self { active }
    }

    pub fn method(self) -> Method {
        Method::ChannelFlow(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChannelFlowOkArgs {
    pub active: bool,
}

impl ChannelFlowOkArgs {
    pub fn new(active: bool) -> Self {
        Self { active }
    }

    pub fn method(self) -> Method {
        Method::ChannelFlowOk(self)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ChannelCloseArgs {
    pub code: u16,
    pub text: String,
    pub class_id: u16,
    pub method_id: u16,
}

impl ChannelCloseArgs {
    pub fn method(self) -> Method {
        Method::ChannelClose(self)
    }
}

/// Close method referring to the class and method which caused the closing.
pub fn channel_close(code: u16, text: &str, class_method: u32) -> Method {
    let (class_id, method_id) = super::split_class_method(class_method);

    Method::ChannelClose(ChannelCloseArgs {
        code,
        text: text.to_string(),
        class_id,
        method_id,
    })
}
