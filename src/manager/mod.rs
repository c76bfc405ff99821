pub mod task_registry;
