use crate::wire::WireRange;

/// A concrete invocation of a named function: the wire ranges bound to
/// its outputs and inputs, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub outputs: Vec<WireRange>,
    pub inputs: Vec<WireRange>,
    pub line: usize,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outputs: Vec::new(),
            inputs: Vec::new(),
            line: 0,
        }
    }
}
