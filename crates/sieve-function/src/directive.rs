//! A [`Directive`] is one recorded upstream callback (spec.md §6.1),
//! minus the function-declaration callbacks themselves — a regular
//! function's body is an ordered buffer of these, replayed through the
//! [`crate::Interpreter`] at every `invoke` (spec.md §4.F).

use smallvec::SmallVec;

use sieve_ir::{ConversionSpec, FieldValue, TypeIndex, WireIdx, WireRange};

/// Every recorded gate/input/convert/invoke callback a function body can
/// contain, each carrying the line number it was recorded at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    AddGate {
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    },
    MulGate {
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        right: WireIdx,
    },
    AddcGate {
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    },
    MulcGate {
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
        constant: FieldValue,
    },
    Copy {
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        left: WireIdx,
    },
    CopyMulti {
        line: usize,
        ty: TypeIndex,
        out: WireRange,
        inputs: SmallVec<[WireRange; 4]>,
    },
    Assign {
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
        constant: FieldValue,
    },
    AssertZero {
        line: usize,
        ty: TypeIndex,
        wire: WireIdx,
    },
    PublicIn {
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
    },
    PublicInMulti {
        line: usize,
        ty: TypeIndex,
        range: WireRange,
    },
    PrivateIn {
        line: usize,
        ty: TypeIndex,
        out: WireIdx,
    },
    PrivateInMulti {
        line: usize,
        ty: TypeIndex,
        range: WireRange,
    },
    Convert {
        line: usize,
        spec: ConversionSpec,
        out_range: WireRange,
        in_range: WireRange,
        modulus: bool,
    },
    NewRange {
        line: usize,
        ty: TypeIndex,
        first: WireIdx,
        last: WireIdx,
    },
    DeleteRange {
        line: usize,
        ty: TypeIndex,
        first: WireIdx,
        last: WireIdx,
    },
    Invoke {
        line: usize,
        name: String,
        outputs: SmallVec<[WireRange; 2]>,
        inputs: SmallVec<[WireRange; 2]>,
    },
}
