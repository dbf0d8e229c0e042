//! Handler system.
//!
//! Listeners are plain functions. [`Handler`] is implemented for async
//! functions and [`SyncHandler`] for ordinary ones, for every arity from 0 to
//! 16 whose parameters implement [`FromContext`]:
//!
//! ```rust,ignore
//! async fn no_params() {}
//! async fn greet(bot: Arc<MiraiBot>, friend: Friend) -> ApiResult<()> {
//!     bot.send_friend_message(&friend, "hi", None).await.map(|_| ())
//! }
//! fn count(raw: Raw) {}
//! ```
//!
//! Binding runs before the listener is invoked, so a parameter that cannot be
//! extracted skips the listener without running any of its code.

use std::future::Future;
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::context::DispatchContext;
use crate::error::{ExtractResult, HandlerError};
use crate::extractor::FromContext;

// ============================================================================
// HandlerOutput
// ============================================================================

/// Return types a listener may have.
pub trait HandlerOutput: Send + 'static {
    /// Converts the value into the observer's view.
    fn into_result(self) -> Result<(), HandlerError>;
}

impl HandlerOutput for () {
    fn into_result(self) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl<E> HandlerOutput for Result<(), E>
where
    E: Into<HandlerError> + Send + 'static,
{
    fn into_result(self) -> Result<(), HandlerError> {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Handler traits
// ============================================================================

/// An async listener.
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Binds the parameters and returns the listener's future.
    fn call(self, ctx: &DispatchContext) -> ExtractResult<BoxFuture<'static, Result<(), HandlerError>>>;
}

/// A synchronous listener, run inline on the dispatching task.
pub trait SyncHandler<T>: Send + Sync + 'static {
    /// Binds the parameters and runs the listener.
    fn call(&self, ctx: &DispatchContext) -> ExtractResult<Result<(), HandlerError>>;
}

macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case, unused_variables)]
        impl<F, Fut, O, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = O> + Send + 'static,
            O: HandlerOutput,
            $( $ty: FromContext + Send + 'static, )*
        {
            fn call(self, ctx: &DispatchContext) -> ExtractResult<BoxFuture<'static, Result<(), HandlerError>>> {
                $(
                    let $ty = $ty::from_context(ctx)?;
                )*

                Ok(Box::pin(async move { (self)($($ty,)*).await.into_result() }))
            }
        }

        #[allow(non_snake_case, unused_variables)]
        impl<F, O, $($ty,)*> SyncHandler<($($ty,)*)> for F
        where
            F: Fn($($ty,)*) -> O + Send + Sync + 'static,
            O: HandlerOutput,
            $( $ty: FromContext + 'static, )*
        {
            fn call(&self, ctx: &DispatchContext) -> ExtractResult<Result<(), HandlerError>> {
                $(
                    let $ty = $ty::from_context(ctx)?;
                )*

                Ok((self)($($ty,)*).into_result())
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15
);
impl_handler!(
    T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12, T13, T14, T15, T16
);

// ============================================================================
// Type erasure
// ============================================================================

/// What binding a listener produced.
pub enum Invocation {
    /// A synchronous listener already ran.
    Completed(Result<(), HandlerError>),
    /// An async listener is ready to be spawned.
    Pending(BoxFuture<'static, Result<(), HandlerError>>),
}

/// Type-erased handler trait for dynamic dispatch.
pub trait ErasedHandler: Send + Sync {
    /// Binds the parameters from `ctx`.
    fn bind(&self, ctx: &DispatchContext) -> ExtractResult<Invocation>;
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn ErasedHandler>;

/// Wraps an async function as an [`ErasedHandler`].
pub struct HandlerFn<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> ErasedHandler for HandlerFn<F, T>
where
    F: Handler<T>,
    T: 'static,
{
    fn bind(&self, ctx: &DispatchContext) -> ExtractResult<Invocation> {
        self.f.clone().call(ctx).map(Invocation::Pending)
    }
}

/// Wraps a synchronous function as an [`ErasedHandler`].
pub struct SyncHandlerFn<F, T> {
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<F, T> ErasedHandler for SyncHandlerFn<F, T>
where
    F: SyncHandler<T>,
    T: 'static,
{
    fn bind(&self, ctx: &DispatchContext) -> ExtractResult<Invocation> {
        match catch_unwind(AssertUnwindSafe(|| self.f.call(ctx))) {
            Ok(bound) => bound.map(Invocation::Completed),
            Err(panic) => Ok(Invocation::Completed(Err(HandlerError::Panic(
                panic_message(panic.as_ref()),
            )))),
        }
    }
}

/// Converts an async function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T>,
    T: 'static,
{
    Arc::new(HandlerFn {
        f,
        _marker: PhantomData,
    })
}

/// Converts a synchronous function into a boxed handler.
pub fn into_sync_handler<F, T>(f: F) -> BoxedHandler
where
    F: SyncHandler<T>,
    T: 'static,
{
    Arc::new(SyncHandlerFn {
        f,
        _marker: PhantomData,
    })
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
