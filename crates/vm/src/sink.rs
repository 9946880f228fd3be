//! Destination for values emitted by the print interrupt.

use stackvm_common::Value;

/// Receives every value a program prints, in order.
pub trait OutputSink {
    fn emit(&mut self, value: Value);
}

impl OutputSink for Vec<Value> {
    fn emit(&mut self, value: Value) {
        self.push(value);
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn emit(&mut self, value: Value) {
        (**self).emit(value);
    }
}
