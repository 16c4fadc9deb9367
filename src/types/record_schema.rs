//! The result-record constructor contract.
//!
//! The fetch/export record is built through a constructor whose parameter
//! order and types must never drift. They are declared once here and every
//! consumer (the host adapter's constructor check, the record encoder, the
//! tests) reads this table instead of repeating literal signatures.

use std::fmt;

/// The host-visible kind of one constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A signed 64-bit integer (timestamps, step).
    Int64,
    /// An ordered sequence of strings (legends).
    StringArray,
    /// A sequence of per-series float64 arrays.
    DoubleMatrix,
}

impl FieldKind {
    /// JVM type descriptor fragment for this kind.
    pub fn jvm_descriptor(&self) -> &'static str {
        match self {
            FieldKind::Int64 => "J",
            FieldKind::StringArray => "[Ljava/lang/String;",
            FieldKind::DoubleMatrix => "[[D",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Int64 => write!(f, "int"),
            FieldKind::StringArray => write!(f, "list[str]"),
            FieldKind::DoubleMatrix => write!(f, "list[array[float]]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordField {
    pub name: &'static str,
    pub kind: FieldKind,
}

/// An ordered constructor signature for a host record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    /// Stable dotted name of the host type.
    pub type_name: &'static str,
    pub fields: &'static [RecordField],
}

/// The `FetchResults` constructor: `(start, end, step, columns, values)`.
pub const FETCH_RESULTS_SCHEMA: RecordSchema = RecordSchema {
    type_name: "rrd_bridge.FetchResults",
    fields: &[
        RecordField { name: "start", kind: FieldKind::Int64 },
        RecordField { name: "end", kind: FieldKind::Int64 },
        RecordField { name: "step", kind: FieldKind::Int64 },
        RecordField { name: "columns", kind: FieldKind::StringArray },
        RecordField { name: "values", kind: FieldKind::DoubleMatrix },
    ],
};

impl RecordSchema {
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Renders the parameter list the way CPython reports `__text_signature__`,
    /// e.g. `(start, end, step, columns, values)`.
    pub fn text_signature(&self) -> String {
        let names: Vec<&str> = self.fields.iter().map(|f| f.name).collect();
        format!("({})", names.join(", "))
    }

    /// Renders the constructor as a JVM method descriptor, e.g.
    /// `(JJJ[Ljava/lang/String;[[D)V`.
    pub fn jvm_descriptor(&self) -> String {
        let params: String = self.fields.iter().map(|f| f.kind.jvm_descriptor()).collect();
        format!("({})V", params)
    }

    /// Renders the annotated form used in error messages and `__repr__`.
    pub fn describe(&self) -> String {
        let params: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.name, f.kind))
            .collect();
        format!("{}({})", self.type_name, params.join(", "))
    }
}
