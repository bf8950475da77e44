use std::collections::HashMap;

use crate::{
    ast::BinaryOp,
    codegen::{Backend, NumericClass},
};

/// Records every emitted operation as a line of pseudo assembly.
#[derive(Default)]
pub struct Recorder {
    pub log: Vec<String>,
    globals: HashMap<String, String>,
    scopes: Vec<HashMap<String, String>>,
    next: usize,
}

impl Recorder {
    fn fresh(&mut self) -> String {
        let value = format!("%{}", self.next);
        self.next += 1;
        value
    }

    fn emit(&mut self, line: String) {
        self.log.push(line);
    }
}

impl Backend for Recorder {
    type Ty = String;
    type Value = String;

    fn void_ty(&mut self) -> String {
        "void".to_owned()
    }

    fn int_ty(&mut self, bits: u32, signed: bool) -> String {
        format!("{}{bits}", if signed { 'i' } else { 'u' })
    }

    fn float_ty(&mut self, bits: u32) -> String {
        format!("f{bits}")
    }

    fn pointer_to(&mut self, pointee: String) -> String {
        format!("{pointee}*")
    }

    fn function_ty(&mut self, ret: String, params: Vec<String>) -> String {
        format!("fn({}) -> {ret}", params.join(", "))
    }

    fn const_int(&mut self, ty: String, value: i64) -> String {
        format!("{ty} {value}")
    }

    fn const_float(&mut self, ty: String, value: f64) -> String {
        format!("{ty} {value:?}")
    }

    fn const_literal(&mut self, text: &str) -> String {
        format!("{text:?}")
    }

    fn declare_function(&mut self, name: &str, ty: String) -> String {
        self.emit(format!("declare @{name}: {ty}"));
        let function = format!("@{name}");
        self.globals.insert(name.to_owned(), function.clone());
        function
    }

    fn begin_function(&mut self, function: &String, arity: usize) -> Vec<String> {
        self.emit(format!("begin {function}"));
        (0..arity).map(|idx| format!("%arg{idx}")).collect()
    }

    fn finish_function(&mut self, function: &String) {
        self.emit(format!("end {function}"));
    }

    fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare_variable(&mut self, name: &str, ty: String) -> String {
        let address = if name.is_empty() {
            self.fresh()
        } else {
            format!("%{name}.addr")
        };
        self.emit(format!("{address} = alloca {ty}"));
        if !name.is_empty() {
            self.bind(name, address.clone());
        }
        address
    }

    fn bind(&mut self, name: &str, address: String) {
        let scope = self.scopes.last_mut().unwrap_or(&mut self.globals);
        scope.insert(name.to_owned(), address);
    }

    fn resolve(&mut self, name: &str) -> Option<String> {
        self.scopes
            .iter()
            .rev()
            .chain(std::iter::once(&self.globals))
            .find_map(|scope| scope.get(name))
            .cloned()
    }

    fn load(&mut self, ty: String, address: String) -> String {
        let value = self.fresh();
        self.emit(format!("{value} = load {ty}, {address}"));
        value
    }

    fn store(&mut self, value: String, address: String) {
        self.emit(format!("store {value}, {address}"));
    }

    fn binary(&mut self, op: BinaryOp, class: NumericClass, lhs: String, rhs: String) -> String {
        let value = self.fresh();
        self.emit(format!("{value} = {op:?} {class:?} {lhs}, {rhs}"));
        value
    }

    fn cast(
        &mut self,
        value: String,
        from: NumericClass,
        to_ty: String,
        to: NumericClass,
    ) -> String {
        let result = self.fresh();
        self.emit(format!("{result} = cast {value} {from:?} to {to_ty} {to:?}"));
        result
    }

    fn call(&mut self, callee: String, args: Vec<String>) -> String {
        let value = self.fresh();
        self.emit(format!("{value} = call {callee}({})", args.join(", ")));
        value
    }

    fn ret(&mut self, value: Option<String>) {
        match value {
            Some(value) => self.emit(format!("ret {value}")),
            None => self.emit("ret".to_owned()),
        }
    }
}
