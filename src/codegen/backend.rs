use crate::ast::BinaryOp;

/// How a backend should treat the operands of an arithmetic operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NumericClass {
    SignedInt,
    UnsignedInt,
    Float,
    /// Pointer arithmetic: the left operand is a pointer, the right an
    /// integer offset in elements.
    Pointer,
}

/// The operations the generator needs from a code generation backend. All
/// handles are opaque to the generator.
pub trait Backend {
    type Ty: Clone;
    type Value: Clone;

    fn void_ty(&mut self) -> Self::Ty;
    fn int_ty(&mut self, bits: u32, signed: bool) -> Self::Ty;
    fn float_ty(&mut self, bits: u32) -> Self::Ty;
    fn pointer_to(&mut self, pointee: Self::Ty) -> Self::Ty;
    fn function_ty(&mut self, ret: Self::Ty, params: Vec<Self::Ty>) -> Self::Ty;

    fn const_int(&mut self, ty: Self::Ty, value: i64) -> Self::Value;
    fn const_float(&mut self, ty: Self::Ty, value: f64) -> Self::Value;
    /// A pointer to the given text, with escape sequences already processed.
    fn const_literal(&mut self, text: &str) -> Self::Value;

    /// Declares a function, making `name` resolvable. Declaring the same
    /// name twice returns the same function.
    fn declare_function(&mut self, name: &str, ty: Self::Ty) -> Self::Value;
    /// Starts emitting the body of `function`, returning its `arity`
    /// incoming arguments.
    fn begin_function(&mut self, function: &Self::Value, arity: usize) -> Vec<Self::Value>;
    fn finish_function(&mut self, function: &Self::Value);

    fn enter_scope(&mut self);
    fn exit_scope(&mut self);
    /// Allocates storage for a value of type `ty`, binds `name` to its address
    /// and returns the address. An empty name allocates an anonymous slot.
    fn declare_variable(&mut self, name: &str, ty: Self::Ty) -> Self::Value;
    /// Binds `name` to an existing address, in the innermost scope.
    fn bind(&mut self, name: &str, address: Self::Value);
    /// The address bound to `name`, or the function declared with it.
    fn resolve(&mut self, name: &str) -> Option<Self::Value>;

    fn load(&mut self, ty: Self::Ty, address: Self::Value) -> Self::Value;
    fn store(&mut self, value: Self::Value, address: Self::Value);
    fn binary(
        &mut self,
        op: BinaryOp,
        class: NumericClass,
        lhs: Self::Value,
        rhs: Self::Value,
    ) -> Self::Value;
    fn cast(
        &mut self,
        value: Self::Value,
        from: NumericClass,
        to_ty: Self::Ty,
        to: NumericClass,
    ) -> Self::Value;
    fn call(&mut self, callee: Self::Value, args: Vec<Self::Value>) -> Self::Value;
    fn ret(&mut self, value: Option<Self::Value>);
}
