//! Well-known types located by metadata name

/// Types the binder needs to find without a source reference
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum SpecialType {
    /// Root of the class hierarchy
    Object,
    /// `bool`
    Boolean,
    /// `int`
    Int32,
    /// `string`
    String,
    /// Completion-notification capability every awaiter must convert to
    NotifyCompletion,
}

impl SpecialType {
    /// Every special type, in resolution order
    pub const ALL: [Self; 5] = [
        Self::Object,
        Self::Boolean,
        Self::Int32,
        Self::String,
        Self::NotifyCompletion,
    ];

    /// Fully qualified metadata name
    #[must_use]
    pub const fn metadata_name(self) -> &'static str {
        match self {
            Self::Object => "System.Object",
            Self::Boolean => "System.Boolean",
            Self::Int32 => "System.Int32",
            Self::String => "System.String",
            Self::NotifyCompletion => "System.Runtime.CompilerServices.INotifyCompletion",
        }
    }
}
