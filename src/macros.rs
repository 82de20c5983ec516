#![allow(unused_macros)]

/// Helper macro for reading locked items, propagates a poisoned lock as [`crate::Error::LockError`]
///
/// ```rust, ignore
///  let data = read_lock!(self.mixin_data);
///  println!("{:?}", data.is_some());
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock.read().map_err(|_| crate::Error::LockError)?
    };
}

/// Helper macro for writing to locked items, propagates a poisoned lock as [`crate::Error::LockError`]
///
/// ```rust, ignore
///  let mut data = write_lock!(self.target);
///  *data = Some(object);
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock.write().map_err(|_| crate::Error::LockError)?
    };
}

/// Helper macro for reading locked items through a closure
///
/// ```rust, ignore
///  let target = with_read!(cell, |target: &Option<ObjectRef>| target.clone());
/// ```
macro_rules! with_read {
    ($rwlock:expr, $closure:expr) => {{
        let guard = read_lock!($rwlock);
        $closure(&*guard)
    }};
}

/// Helper macro for writing to locked items through a closure
///
/// ```rust, ignore
///  with_write!(cell, |target: &mut Option<ObjectRef>| *target = None);
/// ```
macro_rules! with_write {
    ($rwlock:expr, $closure:expr) => {{
        let mut guard = write_lock!($rwlock);
        $closure(&mut *guard)
    }};
}
