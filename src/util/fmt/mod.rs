use crate::util::intern::Interner;

pub mod error;
pub mod tree;

pub struct Context<'ident> {
    pub idents: &'ident Interner,
}

impl<'ident> Context<'ident> {
    pub fn new(idents: &'ident Interner) -> Self {
        Context { idents }
    }
}

/// Analogous to [`std::fmt::Display`], but also receives the program
/// context, such as the identifier [`Interner`].
pub trait Show {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result;

    /// Returns a type which can be displayed.
    fn display(&self, ctx: &Context<'_>) -> impl std::fmt::Display
    where
        Self: Sized,
    {
        Display(self, ctx)
    }

    /// Shorthand for formatting into a new string.
    fn to_string_with(&self, ctx: &Context<'_>) -> String
    where
        Self: Sized,
    {
        self.display(ctx).to_string()
    }
}

struct Display<'this, 'ctx, 'ident, T: Show>(&'this T, &'ctx Context<'ident>);

impl<T> std::fmt::Display for Display<'_, '_, '_, T>
where
    T: Show,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Display(this, ctx) = self;
        this.show(f, ctx)
    }
}
