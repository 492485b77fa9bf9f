//! Running a resolved command.
//!
//! Handlers see a [`Context`] and the [`Environ`]. The `handlerN` adapters
//! let a handler take typed values instead: each `Param` is read when the
//! handler is called, that is after parsing has filled it.

use tokio_util::sync::CancellationToken;

use crate::env::Environ;

pub(crate) type Handler = Box<dyn Fn(&Context, &mut Environ) -> anyhow::Result<()>>;

/// Cancellation shared between the driver and the running handler.
///
/// Parsing never blocks, so only handlers are expected to watch it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Context { token }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.token.cancel()
    }

    /// A context cancelled along with this one, but not the other way round.
    pub fn child(&self) -> Context {
        Context { token: self.token.child_token() }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Something a handler argument can be read from.
pub trait Param<T> {
    fn value(&self) -> T;
}

/// A fixed handler argument.
#[derive(Debug, Clone)]
pub struct Hardcoded<T>(pub T);

impl<T: Clone> Param<T> for Hardcoded<T> {
    fn value(&self) -> T {
        self.0.clone()
    }
}

/// Presents a single value as a one-element `Vec`.
#[derive(Debug, Clone)]
pub struct Singleton<P>(P);

impl<P> Singleton<P> {
    pub fn new(param: P) -> Self {
        Singleton(param)
    }
}

impl<T, P: Param<T>> Param<Vec<T>> for Singleton<P> {
    fn value(&self) -> Vec<T> {
        vec![self.0.value()]
    }
}

macro_rules! handlers {
    ($($(#[$attr:meta])* fn $name:ident($($v:ident: $p:ident => $t:ident),*);)*) => {$(
        $(#[$attr])*
        pub fn $name<$($t, $p,)* F>(
            handler: F,
            $($v: $p,)*
        ) -> impl Fn(&Context, &mut Environ) -> anyhow::Result<()> + 'static
        where
            $($t: 'static, $p: Param<$t> + 'static,)*
            F: Fn(&Context, &mut Environ, $($t),*) -> anyhow::Result<()> + 'static,
        {
            move |ctx: &Context, env: &mut Environ| handler(ctx, env, $($v.value()),*)
        }
    )*};
}

handlers! {
    /// Adapts a handler without typed arguments.
    fn handler0();
    fn handler1(v1: P1 => T1);
    /// Adapts `handler(ctx, env, a, b)` for [`crate::Command::runs`].
    fn handler2(v1: P1 => T1, v2: P2 => T2);
    fn handler3(v1: P1 => T1, v2: P2 => T2, v3: P3 => T3);
    fn handler4(v1: P1 => T1, v2: P2 => T2, v3: P3 => T3, v4: P4 => T4);
    fn handler5(v1: P1 => T1, v2: P2 => T2, v3: P3 => T3, v4: P4 => T4, v5: P5 => T5);
    /// Adapts a handler taking six typed arguments.
    fn handler6(
        v1: P1 => T1, v2: P2 => T2, v3: P3 => T3, v4: P4 => T4, v5: P5 => T5, v6: P6 => T6
    );
}
