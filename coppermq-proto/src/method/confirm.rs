use super::Method;

#[derive(Clone, Debug, Default)]
pub struct ConfirmSelectArgs {
    pub no_wait: bool,
}

impl ConfirmSelectArgs {
    pub fn method(self) -> Method {
        Method::ConfirmSelect(self)
    }
}

pub fn confirm_select() -> Method {
    Method::ConfirmSelect(ConfirmSelectArgs { no_wait: false })
}
