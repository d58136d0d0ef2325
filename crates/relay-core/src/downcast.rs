//! Downcasting support for shared trait objects.

use std::any::Any;
use std::sync::Arc;

/// Converts a shared trait object back into `Arc<dyn Any>`.
///
/// Implemented for every sized `'static` type, so adapters and plugins get it
/// for free. Used by the runtime's typed lookups.
pub trait AsAny: Any + Send + Sync {
    /// Erases `self` into `Arc<dyn Any + Send + Sync>` for downcasting.
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: AsAny {
        fn name(&self) -> &str;
    }

    struct Console;

    impl Named for Console {
        fn name(&self) -> &str {
            "console"
        }
    }

    #[test]
    fn test_downcast_through_trait_object() {
        let named: Arc<dyn Named> = Arc::new(Console);
        assert_eq!(named.name(), "console");

        let any = Arc::clone(&named).as_any();
        assert!(any.downcast::<Console>().is_ok());
        assert!(named.as_any().downcast::<String>().is_err());
    }
}
