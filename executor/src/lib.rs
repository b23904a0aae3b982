pub mod rpc;      // RPC-backed NetworkPort
pub mod transfer; // Transfer executor

pub use rpc::RpcNetwork;
pub use transfer::execute_transfer;
