///////////////////////////////////////////////////////////////////////////////
// p4.config.v1 ///////////////////////////////////////////////////////////////

/// The description of a compiled P4 program: its tables, actions and package
/// metadata, addressable by ID from table-entry writes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct P4Info {
    /// Package-level metadata of the program.
    #[prost(message, optional, tag = "1")]
    pub pkg_info: ::core::option::Option<PkgInfo>,
    /// All match-action tables of the program.
    #[prost(message, repeated, tag = "2")]
    pub tables: ::prost::alloc::vec::Vec<Table>,
    /// All actions of the program.
    #[prost(message, repeated, tag = "3")]
    pub actions: ::prost::alloc::vec::Vec<Action>,
}
/// Top-level package documentation of a P4 program.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PkgInfo {
    /// The name of the P4 program.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    /// The version of the P4 program.
    #[prost(string, tag = "2")]
    pub version: ::prost::alloc::string::String,
    /// Miscellaneous annotations on the program.
    #[prost(string, repeated, tag = "4")]
    pub annotations: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    /// The target architecture of the program, e.g. `v1model`, `psa`.
    #[prost(string, tag = "5")]
    pub arch: ::prost::alloc::string::String,
    /// The organization which produced the program.
    #[prost(string, tag = "6")]
    pub organization: ::prost::alloc::string::String,
    /// A contact for the program.
    #[prost(string, tag = "7")]
    pub contact: ::prost::alloc::string::String,
}
/// Common metadata shared by all P4 entities.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Preamble {
    /// Unique instance ID, referenced by table-entry writes.
    #[prost(uint32, tag = "1")]
    pub id: u32,
    /// Fully qualified name of the P4 object.
    #[prost(string, tag = "2")]
    pub name: ::prost::alloc::string::String,
    /// Short name of the P4 object.
    #[prost(string, tag = "3")]
    pub alias: ::prost::alloc::string::String,
    #[prost(string, repeated, tag = "4")]
    pub annotations: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}
/// A match-action table.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Table {
    #[prost(message, optional, tag = "1")]
    pub preamble: ::core::option::Option<Preamble>,
    /// The fields this table matches on.
    #[prost(message, repeated, tag = "2")]
    pub match_fields: ::prost::alloc::vec::Vec<MatchField>,
    /// The actions this table may invoke.
    #[prost(message, repeated, tag = "3")]
    pub action_refs: ::prost::alloc::vec::Vec<ActionRef>,
    /// Maximum number of entries the table can hold.
    #[prost(int64, tag = "9")]
    pub size: i64,
}
/// A single match field of a table.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MatchField {
    #[prost(uint32, tag = "1")]
    pub id: u32,
    #[prost(string, tag = "2")]
    pub name: ::prost::alloc::string::String,
    #[prost(int32, tag = "4")]
    pub bitwidth: i32,
    #[prost(enumeration = "match_field::MatchType", tag = "5")]
    pub match_type: i32,
}
/// Nested message and enum types in `MatchField`.
pub mod match_field {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum MatchType {
        Unspecified = 0,
        Exact = 2,
        Lpm = 3,
        Ternary = 4,
        Range = 5,
        Optional = 6,
    }
}
/// A reference to an action usable from a table.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ActionRef {
    #[prost(uint32, tag = "1")]
    pub id: u32,
}
/// An action of the program.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Action {
    #[prost(message, optional, tag = "1")]
    pub preamble: ::core::option::Option<Preamble>,
    /// The runtime parameters of the action.
    #[prost(message, repeated, tag = "2")]
    pub params: ::prost::alloc::vec::Vec<action::Param>,
}
/// Nested message and enum types in `Action`.
pub mod action {
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Param {
        #[prost(uint32, tag = "1")]
        pub id: u32,
        #[prost(string, tag = "2")]
        pub name: ::prost::alloc::string::String,
        #[prost(int32, tag = "4")]
        pub bitwidth: i32,
    }
}
