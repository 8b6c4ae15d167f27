mod closing;
mod confirm;
mod direct;
mod flow;
mod helper;
mod open_close;
