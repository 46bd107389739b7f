//! Concrete syntax tree the engine consumes (spec §3).
//!
//! The engine does not enumerate SystemVerilog grammar productions; it
//! operates on a finite set of *partition roles* (spec §1) that a real
//! front end maps its much larger `NodeEnum` onto. `CstRole` is that finite
//! set.

/// The finite set of CST roles the engine dispatches on. A front end's own
/// `NodeEnum` (its closed set of grammar-production tags) is expected to
/// map onto this set; roles with no mapping fall back to `Generic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CstRole {
    ModuleDeclaration,
    ModuleHeader,
    InterfaceDeclaration,
    ClassDeclaration,
    TaskDeclaration,
    FunctionDeclaration,
    PortDeclaration,
    PortDeclarationList,
    NamedPortConnection,
    FormalParameterList,
    ParameterItem,
    NamedParameterArgument,
    DataDeclaration,
    NetDeclaration,
    ClassMemberVariable,
    StructUnionMember,
    ContinuousAssignment,
    BlockingAssignment,
    NonblockingAssignment,
    Statement,
    CaseStatement,
    CaseItem,
    ConditionalGenerateIf,
    IfStatement,
    ElseClause,
    BeginEndBlock,
    EnumValueAssignment,
    DistributionItem,
    MacroCall,
    MacroArgument,
    PreprocessorDirective,
    FormatOffMarker,
    FormatOnMarker,
    Comment,
    Generic,
}

impl CstRole {
    /// Roles that the unwrapped-line builder always splits into their own
    /// partition, regardless of surrounding context (spec §4.1).
    pub fn always_own_partition(self) -> bool {
        matches!(
            self,
            CstRole::ModuleHeader
                | CstRole::PortDeclaration
                | CstRole::ParameterItem
                | CstRole::Statement
                | CstRole::CaseItem
                | CstRole::BeginEndBlock
                | CstRole::NamedParameterArgument
                | CstRole::NamedPortConnection
                | CstRole::StructUnionMember
                | CstRole::PreprocessorDirective
        )
    }

    /// Roles whose children are candidates for the alignment engine
    /// (spec §4.4).
    pub fn is_tabular_container(self) -> bool {
        matches!(
            self,
            CstRole::PortDeclarationList
                | CstRole::FormalParameterList
                | CstRole::DataDeclaration
                | CstRole::NetDeclaration
                | CstRole::ClassMemberVariable
                | CstRole::StructUnionMember
                | CstRole::ContinuousAssignment
                | CstRole::BlockingAssignment
                | CstRole::NonblockingAssignment
                | CstRole::CaseStatement
                | CstRole::EnumValueAssignment
                | CstRole::DistributionItem
                | CstRole::NamedParameterArgument
                | CstRole::NamedPortConnection
        )
    }
}

/// A node in the concrete syntax tree. Leaves reference a token-stream
/// index range; interior nodes carry a `CstRole` and children.
#[derive(Debug, Clone)]
pub enum CstNode {
    Leaf {
        role: CstRole,
        /// Index range into the `TokenStream` this tree was built from.
        token_range: std::ops::Range<usize>,
    },
    Interior {
        role: CstRole,
        children: Vec<CstNode>,
    },
}

impl CstNode {
    pub fn role(&self) -> CstRole {
        match self {
            CstNode::Leaf { role, .. } => *role,
            CstNode::Interior { role, .. } => *role,
        }
    }

    pub fn children(&self) -> &[CstNode] {
        match self {
            CstNode::Leaf { .. } => &[],
            CstNode::Interior { children, .. } => children,
        }
    }

    /// The full token-index range spanned by this node, computed from its
    /// own range (leaf) or the union of its children's ranges (interior).
    /// Returns `None` for an interior node with no children, which the
    /// builder treats as `InternalInvariantViolated` (spec §4.1).
    pub fn token_range(&self) -> Option<std::ops::Range<usize>> {
        match self {
            CstNode::Leaf { token_range, .. } => Some(token_range.clone()),
            CstNode::Interior { children, .. } => {
                let first = children.first()?.token_range()?;
                let last = children.last()?.token_range()?;
                Some(first.start..last.end)
            }
        }
    }
}
