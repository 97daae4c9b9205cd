pub mod negotiator;
pub mod network;
pub mod pasv;
pub mod port;
