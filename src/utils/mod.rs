pub mod balance_cache;
pub mod employee_locks;
pub mod wizard_sessions;
