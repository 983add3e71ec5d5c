#[derive(Debug, thiserror::Error)]
pub enum SleepLockError {
    #[error("locking process already killed")]
    LockingProcessAlreadyKilled,
}
