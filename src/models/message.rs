use super::{
    result::CommandResult,
    task::{TaskToken, ViewId},
};

/// Posted by a worker thread back onto the event loop once its command exits.
#[derive(Debug)]
pub struct Completion {
    pub view: ViewId,
    pub token: TaskToken,
    pub result: CommandResult,
}
