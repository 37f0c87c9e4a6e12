mod codec;
mod prefix;
mod stub;
