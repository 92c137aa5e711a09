//! Static language documentation
//!
//! The analysis core treats the SLiM/Eidos API surface as read-only lookup
//! tables: functions, classes (with their methods and properties), callback
//! blocks, value types, and operators. The tables are deserialized once from
//! the JSON resources embedded in the binary; absence of a key always means
//! "unknown, skip", never an error.
//!
//! Fixed language facts that never change shape (keyword sets, callback
//! names, pseudo-parameter tables) are compile-time `phf` sets and maps.

use std::collections::HashMap;
use std::sync::LazyLock;

use phf::{phf_map, phf_set};
use serde::Deserialize;

/// A documented built-in function.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDoc {
    pub signature: String,
    pub description: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "returnType", default)]
    pub return_type: Option<String>,
}

/// A documented method on a class.
#[derive(Debug, Clone, Deserialize)]
pub struct MethodDoc {
    pub signature: String,
    pub description: String,
}

/// A documented property on a class.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDoc {
    #[serde(rename = "type")]
    pub value_type: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassDoc {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub constructor: Option<MethodDoc>,
    #[serde(default)]
    pub methods: HashMap<String, MethodDoc>,
    #[serde(default)]
    pub properties: HashMap<String, PropertyDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackDoc {
    pub signature: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeDoc {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorDoc {
    pub signature: String,
    pub description: String,
    pub symbol: String,
}

/// The loaded documentation tables.
pub struct Docs {
    pub functions: HashMap<String, FunctionDoc>,
    pub classes: HashMap<String, ClassDoc>,
    pub callbacks: HashMap<String, CallbackDoc>,
    pub types: HashMap<String, TypeDoc>,
    pub operators: HashMap<String, OperatorDoc>,
}

/// The class every object value inherits from; its members are legal on any
/// instance.
pub const BASE_CLASS: &str = "Object";

static DOCS: LazyLock<Docs> = LazyLock::new(|| Docs {
    functions: serde_json::from_str(include_str!("../resources/functions.json"))
        .expect("functions.json is valid"),
    classes: serde_json::from_str(include_str!("../resources/classes.json"))
        .expect("classes.json is valid"),
    callbacks: serde_json::from_str(include_str!("../resources/callbacks.json"))
        .expect("callbacks.json is valid"),
    types: serde_json::from_str(include_str!("../resources/types.json"))
        .expect("types.json is valid"),
    operators: serde_json::from_str(include_str!("../resources/operators.json"))
        .expect("operators.json is valid"),
});

/// The process-wide documentation tables, loaded on first access.
pub fn docs() -> &'static Docs {
    &DOCS
}

impl Docs {
    pub fn function(&self, name: &str) -> Option<&FunctionDoc> {
        self.functions.get(name)
    }

    pub fn class(&self, name: &str) -> Option<&ClassDoc> {
        self.classes.get(name)
    }

    pub fn callback(&self, key: &str) -> Option<&CallbackDoc> {
        self.callbacks.get(key)
    }

    /// Look up a method on `class`, falling back to the universal base class.
    pub fn method(&self, class: &str, name: &str) -> Option<&MethodDoc> {
        if let Some(doc) = self.classes.get(class).and_then(|c| c.methods.get(name)) {
            return Some(doc);
        }
        self.classes
            .get(BASE_CLASS)
            .and_then(|c| c.methods.get(name))
    }

    /// Look up a property on `class`, falling back to the universal base class.
    pub fn property(&self, class: &str, name: &str) -> Option<&PropertyDoc> {
        if let Some(doc) = self.classes.get(class).and_then(|c| c.properties.get(name)) {
            return Some(doc);
        }
        self.classes
            .get(BASE_CLASS)
            .and_then(|c| c.properties.get(name))
    }

    /// Whether `name` is a known method or property of `class` (or of the
    /// universal base class).
    pub fn has_member(&self, class: &str, name: &str) -> bool {
        self.method(class, name).is_some() || self.property(class, name).is_some()
    }

    /// Whether `name` is a documented class with a callable constructor.
    pub fn is_constructor(&self, name: &str) -> bool {
        self.classes
            .get(name)
            .map_or(false, |c| c.constructor.is_some())
    }
}

/// One positional parameter parsed out of a signature string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_code: String,
    pub nullable: bool,
    pub optional: bool,
}

/// Parse the parameter list out of an Eidos-style signature such as
/// `(object<Subpopulation>$)addSubpop(is$ subpopID, integer$ size,
/// [float$ sexRatio = 0.5])`. Nullability is carried by an `N` (or `*`) in
/// the parameter's type code; optional parameters are bracketed. Anything
/// unparseable yields no parameter rather than an error.
pub fn signature_parameters(signature: &str) -> Vec<Parameter> {
    let bytes = signature.as_bytes();

    // Skip a leading parenthesized return type, then take the next group.
    let mut params_open = None;
    let mut i = 0;
    if bytes.first() == Some(&b'(') {
        let mut depth = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        i += 1;
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }
    while i < bytes.len() {
        if bytes[i] == b'(' {
            params_open = Some(i);
            break;
        }
        i += 1;
    }
    let Some(open) = params_open else {
        return Vec::new();
    };

    // Collect up to the matching close, splitting on top-level commas.
    let mut depth = 0;
    let mut pieces = Vec::new();
    let mut piece_start = open + 1;
    let mut end = bytes.len();
    for (j, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' | b'[' | b'<' => depth += 1,
            b')' | b']' | b'>' => {
                depth -= 1;
                if depth == 0 && b == b')' {
                    end = j;
                    break;
                }
            }
            b',' if depth == 1 => {
                pieces.push(&signature[piece_start..j]);
                piece_start = j + 1;
            }
            _ => {}
        }
    }
    if piece_start < end {
        pieces.push(&signature[piece_start..end]);
    }

    let mut parameters = Vec::new();
    for piece in pieces {
        let mut text = piece.trim();
        if text.is_empty() || text == "void" || text == "..." {
            continue;
        }
        let optional = text.starts_with('[');
        text = text.trim_start_matches('[').trim_end_matches(']').trim();
        let text = text.split('=').next().unwrap_or(text).trim();

        let mut tokens = text.split_whitespace();
        let (Some(type_code), Some(name)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let code_prefix = type_code.split('<').next().unwrap_or(type_code);
        parameters.push(Parameter {
            name: name.to_string(),
            type_code: type_code.to_string(),
            nullable: code_prefix.contains('N') || code_prefix.contains('*'),
            optional,
        });
    }
    parameters
}

/// Callback name -> the key used in tracking state and documentation.
pub static CALLBACK_KEYS: phf::Map<&'static str, &'static str> = phf_map! {
    "initialize" => "initialize()",
    "first" => "first()",
    "early" => "early()",
    "late" => "late()",
    "fitnessEffect" => "fitnessEffect()",
    "mutationEffect" => "mutationEffect()",
    "interaction" => "interaction()",
    "mateChoice" => "mateChoice()",
    "modifyChild" => "modifyChild()",
    "recombination" => "recombination()",
    "mutation" => "mutation()",
    "reproduction" => "reproduction()",
    "survival" => "survival()",
};

pub static CONTROL_KEYWORDS: phf::Set<&'static str> = phf_set! {
    "if", "else", "do", "while", "for", "in", "next", "break", "return", "function",
};

/// Identifiers the language claims for itself; scripts may not bind them.
pub static RESERVED_IDENTIFIERS: phf::Set<&'static str> = phf_set! {
    "T", "F", "NULL", "NAN", "INF", "PI", "E",
    "sim", "community", "slimgui", "self",
    "individual", "genome1", "genome2", "subpop", "sourceSubpop",
    "if", "else", "do", "while", "for", "in", "next", "break", "return", "function",
};

/// Functions whose result is numeric; an expression headed by one of these
/// never carries an object class, whatever calls appear inside it.
pub static NUMERIC_FUNCTIONS: phf::Set<&'static str> = phf_set! {
    "sum", "mean", "max", "min", "sd", "var", "abs", "sqrt", "exp",
    "log", "log10", "log2", "round", "floor", "ceil", "trunc",
    "size", "length", "sin", "cos", "tan", "asin", "acos", "atan", "atan2",
    "product", "range", "cumProduct", "cumSum",
};

/// Functions whose result is logical.
pub static LOGICAL_FUNCTIONS: phf::Set<&'static str> = phf_set! {
    "any", "all", "exists", "isNULL", "isFloat", "isInteger", "isLogical",
    "isObject", "isString", "isFinite", "isInfinite", "isNAN",
};

/// Name prefixes that mark a bare call as belonging to the simulation API;
/// unknown names outside these prefixes are assumed to be user functions.
pub const FUNCTION_NAME_PREFIXES: [&str; 5] =
    ["initialize", "define", "calc", "register", "output"];

/// Callback types that cannot be declared under a WF model.
pub static WF_FORBIDDEN_CALLBACKS: phf::Set<&'static str> = phf_set! {
    "reproduction", "survival",
};

/// Callback types that cannot be declared under a nonWF model.
pub static NONWF_FORBIDDEN_CALLBACKS: phf::Set<&'static str> = phf_set! {
    "mateChoice",
};

/// Callback contexts from which `evaluate()` may not be called.
pub static EVALUATE_FORBIDDEN_CONTEXTS: phf::Set<&'static str> = phf_set! {
    "interaction()",
};

const MUTATION_EFFECT_PARAMS: &[(&str, &str)] = &[
    ("mut", "Mutation"),
    ("homozygous", "logical"),
    ("effect", "float"),
    ("individual", "Individual"),
    ("subpop", "Subpopulation"),
];
const FITNESS_EFFECT_PARAMS: &[(&str, &str)] =
    &[("individual", "Individual"), ("subpop", "Subpopulation")];
const INTERACTION_PARAMS: &[(&str, &str)] = &[
    ("distance", "float"),
    ("strength", "float"),
    ("receiver", "Individual"),
    ("exerter", "Individual"),
];
const MATE_CHOICE_PARAMS: &[(&str, &str)] = &[
    ("individual", "Individual"),
    ("subpop", "Subpopulation"),
    ("sourceSubpop", "Subpopulation"),
    ("weights", "float"),
];
const MODIFY_CHILD_PARAMS: &[(&str, &str)] = &[
    ("child", "Individual"),
    ("isCloning", "logical"),
    ("isSelfing", "logical"),
    ("parent1", "Individual"),
    ("parent2", "Individual"),
    ("subpop", "Subpopulation"),
    ("sourceSubpop", "Subpopulation"),
];
const RECOMBINATION_PARAMS: &[(&str, &str)] = &[
    ("individual", "Individual"),
    ("genome1", "Genome"),
    ("genome2", "Genome"),
    ("subpop", "Subpopulation"),
    ("breakpoints", "integer"),
];
const MUTATION_PARAMS: &[(&str, &str)] = &[
    ("mut", "Mutation"),
    ("genome", "Genome"),
    ("element", "GenomicElementType"),
    ("originalNuc", "integer"),
    ("parent", "Individual"),
    ("subpop", "Subpopulation"),
];
const REPRODUCTION_PARAMS: &[(&str, &str)] =
    &[("individual", "Individual"), ("subpop", "Subpopulation")];
const SURVIVAL_PARAMS: &[(&str, &str)] = &[
    ("individual", "Individual"),
    ("subpop", "Subpopulation"),
    ("surviving", "logical"),
    ("fitness", "float"),
    ("draw", "float"),
];
const NO_PARAMS: &[(&str, &str)] = &[];

/// Callback key -> the implicit variables available inside that callback's
/// body, with their classes.
pub static PSEUDO_PARAMETERS: phf::Map<&'static str, &'static [(&'static str, &'static str)]> = phf_map! {
    "initialize()" => NO_PARAMS,
    "first()" => NO_PARAMS,
    "early()" => NO_PARAMS,
    "late()" => NO_PARAMS,
    "fitnessEffect()" => FITNESS_EFFECT_PARAMS,
    "mutationEffect()" => MUTATION_EFFECT_PARAMS,
    "interaction()" => INTERACTION_PARAMS,
    "mateChoice()" => MATE_CHOICE_PARAMS,
    "modifyChild()" => MODIFY_CHILD_PARAMS,
    "recombination()" => RECOMBINATION_PARAMS,
    "mutation()" => MUTATION_PARAMS,
    "reproduction()" => REPRODUCTION_PARAMS,
    "survival()" => SURVIVAL_PARAMS,
};

/// Pseudo-parameter name -> the callback keys in which it is defined.
pub static PSEUDO_PARAMETER_HOMES: LazyLock<HashMap<&'static str, Vec<&'static str>>> =
    LazyLock::new(|| {
        let mut homes: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        for (key, params) in PSEUDO_PARAMETERS.entries() {
            for (name, _) in params.iter() {
                homes.entry(name).or_default().push(key);
            }
        }
        homes
    });

/// Resolve the class of the fixed global instances and the
/// numbered-identifier naming conventions.
pub fn static_instance_class(name: &str) -> Option<&'static str> {
    match name {
        "sim" => return Some("Species"),
        "community" => return Some("Community"),
        _ => {}
    }
    let mut chars = name.chars();
    let first = chars.next()?;
    if name.len() > 1 && chars.all(|c| c.is_ascii_digit()) {
        return match first {
            'p' => Some("Subpopulation"),
            'm' => Some("MutationType"),
            'g' => Some("GenomicElementType"),
            'i' => Some("InteractionType"),
            's' => Some("SLiMEidosBlock"),
            _ => None,
        };
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_load() {
        let docs = docs();
        assert!(docs.function("initializeMutationType").is_some());
        assert!(docs.class("Subpopulation").is_some());
        assert!(docs.callback("mutationEffect()").is_some());
        assert!(docs.types.contains_key("float"));
        assert!(!docs.operators.is_empty());
    }

    #[test]
    fn base_class_members_resolve_for_every_class() {
        let docs = docs();
        assert!(docs.has_member("Mutation", "size"));
        assert!(docs.has_member("Subpopulation", "str"));
    }

    #[test]
    fn signature_parameters_parse_types_and_nullability() {
        let params = signature_parameters(
            "(object<SLiMEidosBlock>$)registerMutationEffectCallback(Nis$ id, string$ source, io<MutationType>$ mutType, [Nio<Subpopulation>$ subpop = NULL])",
        );
        assert_eq!(params.len(), 4);
        assert_eq!(params[0].name, "id");
        assert!(params[0].nullable);
        assert!(!params[1].nullable);
        assert_eq!(params[2].name, "mutType");
        assert!(!params[2].nullable);
        assert!(params[3].nullable);
        assert!(params[3].optional);
    }

    #[test]
    fn signature_parameters_handle_void_and_defaults() {
        assert!(signature_parameters("(integer$)length(void)").is_empty());
        let params =
            signature_parameters("(void)setValue(is$ key, * value)");
        assert_eq!(params.len(), 2);
        assert!(params[1].nullable);
    }

    #[test]
    fn static_instances_resolve_by_convention() {
        assert_eq!(static_instance_class("sim"), Some("Species"));
        assert_eq!(static_instance_class("p12"), Some("Subpopulation"));
        assert_eq!(static_instance_class("m1"), Some("MutationType"));
        assert_eq!(static_instance_class("q1"), None);
        assert_eq!(static_instance_class("p"), None);
        assert_eq!(static_instance_class("p1x"), None);
    }
}
