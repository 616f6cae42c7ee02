use serde::{Deserialize, Deserializer};

pub mod task;
pub mod todo;
pub mod user;

pub use task::{NewTask, Task, TaskField, TaskPatch, TaskView};
pub use todo::{NewTodo, Todo, TodoDetail, TodoField, TodoPatch, TodoView};
pub use user::{NewUser, User};

/// Reads a patch field where `null` clears the value: absent is `None`,
/// `null` is `Some(None)`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
