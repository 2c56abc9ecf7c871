//! Controlled vocabularies used by the graph model
//!
//! Every vocabulary is a closed enum that is resolved by *name*: the
//! canonical SCREAMING_SNAKE_CASE spelling is what gets written to disk, and
//! lookups accept any ASCII casing (`"implements"`, `"IMPLEMENTS"`).
//! An unknown name is always an error. Callers that want a fallback apply it
//! themselves, so the decision between "default" and "fail" stays visible at
//! the call site.
//!
//! Only the subset of each vocabulary that the persistence layer needs to
//! round-trip is carried here.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

macro_rules! vocabulary {
    (
        $(#[$doc:meta])*
        $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $(
                #[doc = concat!("`", $text, "`")]
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical on-disk name
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Resolve a member by name (ASCII case-insensitive)
            pub fn from_name(name: &str) -> Result<Self> {
                let wanted = name.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|member| member.name().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| Error::UnknownVariant {
                        vocabulary: stringify!($name),
                        name: name.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_name(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let name = String::deserialize(deserializer)?;
                Self::from_name(&name).map_err(serde::de::Error::custom)
            }
        }
    };
}

vocabulary! {
    /// Kind tag carried by every relationship
    RelationshipKind {
        // Governance
        Governs => "GOVERNS",
        Regulates => "REGULATES",
        Authorizes => "AUTHORIZES",
        Mandates => "MANDATES",
        Enforces => "ENFORCES",
        Delegates => "DELEGATES",
        Represents => "REPRESENTS",
        Monitors => "MONITORS",
        Licenses => "LICENSES",
        Affects => "AFFECTS",
        Enacts => "ENACTS",
        Implements => "IMPLEMENTS",
        Legitimizes => "LEGITIMIZES",
        // Economic
        Funds => "FUNDS",
        Pays => "PAYS",
        Allocates => "ALLOCATES",
        Transfers => "TRANSFERS",
        Extracts => "EXTRACTS",
        Consumes => "CONSUMES",
        Produces => "PRODUCES",
        Distributes => "DISTRIBUTES",
        Stores => "STORES",
        Converts => "CONVERTS",
        Recycles => "RECYCLES",
        BuysFrom => "BUYS_FROM",
        SellsTo => "SELLS_TO",
        CompetesWith => "COMPETES_WITH",
        Supplies => "SUPPLIES",
        Employs => "EMPLOYS",
        ContractsWith => "CONTRACTS_WITH",
        InvestsIn => "INVESTS_IN",
        Subsidizes => "SUBSIDIZES",
        Taxes => "TAXES",
        Owns => "OWNS",
        ExchangesWith => "EXCHANGES_WITH",
        BenefitsFrom => "BENEFITS_FROM",
        // Information
        Informs => "INFORMS",
        Advises => "ADVISES",
        Educates => "EDUCATES",
        Researches => "RESEARCHES",
        CommunicatesWith => "COMMUNICATES_WITH",
        Measures => "MEASURES",
        // Social
        CollaboratesWith => "COLLABORATES_WITH",
        Serves => "SERVES",
        Supports => "SUPPORTS",
        ParticipatesIn => "PARTICIPATES_IN",
        CoordinatesWith => "COORDINATES_WITH",
        Facilitates => "FACILITATES",
        Mediates => "MEDIATES",
        AdvocatesFor => "ADVOCATES_FOR",
        Trusts => "TRUSTS",
        Values => "VALUES",
        // Influence
        Influences => "INFLUENCES",
        Constrains => "CONSTRAINS",
        Enables => "ENABLES",
        Incentivizes => "INCENTIVIZES",
        Shapes => "SHAPES",
        Strengthens => "STRENGTHENS",
        Weakens => "WEAKENS",
        Transforms => "TRANSFORMS",
        // Operational and structural
        Operates => "OPERATES",
        Maintains => "MAINTAINS",
        Uses => "USES",
        Contains => "CONTAINS",
        BelongsTo => "BELONGS_TO",
        Connects => "CONNECTS",
        LocatedIn => "LOCATED_IN",
        DependsOn => "DEPENDS_ON",
        // Temporal
        Precedes => "PRECEDES",
        Follows => "FOLLOWS",
        Triggers => "TRIGGERS",
        // Environmental
        Sustains => "SUSTAINS",
        Pollutes => "POLLUTES",
        Conserves => "CONSERVES",
    }
}

vocabulary! {
    /// Category of a resource node
    ResourceType {
        Natural => "NATURAL",
        Produced => "PRODUCED",
        Human => "HUMAN",
        Information => "INFORMATION",
        Financial => "FINANCIAL",
        Monetary => "MONETARY",
        Credit => "CREDIT",
        Intellectual => "INTELLECTUAL",
        Knowledge => "KNOWLEDGE",
        Cultural => "CULTURAL",
        SocialCapital => "SOCIAL_CAPITAL",
        Political => "POLITICAL",
        Built => "BUILT",
        Land => "LAND",
        Water => "WATER",
        Mineral => "MINERAL",
        Biological => "BIOLOGICAL",
        Digital => "DIGITAL",
        Data => "DATA",
        Organizational => "ORGANIZATIONAL",
    }
}

impl Default for ResourceType {
    fn default() -> Self {
        ResourceType::Natural
    }
}

vocabulary! {
    /// Nature of a flow node
    FlowNature {
        Input => "INPUT",
        Output => "OUTPUT",
        Transfer => "TRANSFER",
        Conversion => "CONVERSION",
        Extraction => "EXTRACTION",
        Processing => "PROCESSING",
        Recycling => "RECYCLING",
        Waste => "WASTE",
        Financial => "FINANCIAL",
        Material => "MATERIAL",
        Energy => "ENERGY",
        Information => "INFORMATION",
        Social => "SOCIAL",
        Service => "SERVICE",
        Regulatory => "REGULATORY",
        Import => "IMPORT",
        Export => "EXPORT",
        Taxation => "TAXATION",
        Subsidy => "SUBSIDY",
        Wage => "WAGE",
        Rent => "RENT",
        Interest => "INTEREST",
    }
}

impl Default for FlowNature {
    fn default() -> Self {
        FlowNature::Transfer
    }
}

vocabulary! {
    /// Physical or social medium of a flow
    FlowType {
        Material => "MATERIAL",
        Energy => "ENERGY",
        Information => "INFORMATION",
        Financial => "FINANCIAL",
        Social => "SOCIAL",
    }
}

impl Default for FlowType {
    fn default() -> Self {
        FlowType::Material
    }
}

vocabulary! {
    /// Hayden's institutional layers plus the extended institutional forms
    InstitutionLayer {
        FormalRule => "FORMAL_RULE",
        Organization => "ORGANIZATION",
        InformalNorm => "INFORMAL_NORM",
        CulturalValue => "CULTURAL_VALUE",
        PolicyInstrument => "POLICY_INSTRUMENT",
        MarketMechanism => "MARKET_MECHANISM",
        Network => "NETWORK",
        TechnologicalStandard => "TECHNOLOGICAL_STANDARD",
        ProfessionalPractice => "PROFESSIONAL_PRACTICE",
        CommunityGovernance => "COMMUNITY_GOVERNANCE",
        InternationalRegime => "INTERNATIONAL_REGIME",
        HybridInstitution => "HYBRID_INSTITUTION",
        KnowledgeSystem => "KNOWLEDGE_SYSTEM",
        PlanningFramework => "PLANNING_FRAMEWORK",
        RegulatoryRegime => "REGULATORY_REGIME",
        TraditionalAuthority => "TRADITIONAL_AUTHORITY",
        EmergentInstitution => "EMERGENT_INSTITUTION",
    }
}

vocabulary! {
    /// Polarity of a feedback loop
    FeedbackPolarity {
        Reinforcing => "REINFORCING",
        Balancing => "BALANCING",
    }
}
