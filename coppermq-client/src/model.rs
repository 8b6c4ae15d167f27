use coppermq_proto::method;

/// AMQP channel number
pub type ChannelNumber = method::Channel;
/// AMQP method class id
pub type ClassId = method::ClassId;
/// AMQP class id method id number
pub type ClassMethod = method::ClassMethod;
