// In: src/bridge/binding.rs

//! The binding generator: turns `ExposedType` descriptors into the flat
//! exported symbol table ({constructor, method thunks, destructor} per type),
//! and renders that table as a C header or a JSON manifest.
//!
//! Generation is pure and stateless. It validates the hierarchy (unique names,
//! known bases, no cycles, C identifiers), resolves overrides along each base
//! chain, and guarantees every emitted symbol is distinct.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::bridge::naming;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::types::{CType, ExposedType, MethodKind, MethodSig};

/// Prototypes of the runtime support symbols, appended to every header.
const SUPPORT_PROTOTYPES: &[&str] = &[
    "const char* bridge_last_error(void);",
    "int32_t bridge_last_status(void);",
    "void bridge_clear_error(void);",
    "size_t bridge_live_handles(void);",
    "size_t bridge_shutdown(void);",
    "int32_t bridge_configure(const char* json);",
    "int32_t bridge_enable_verbose_logging(const char* log_file);",
    "char* bridge_header(void);",
    "char* bridge_manifest_json(void);",
    "void bridge_string_free(char* s);",
    "const char* bridge_version(void);",
];

/// What an exported symbol does for its type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum SymbolRole {
    Constructor,
    Method {
        method: String,
        kind: MethodKind,
        /// The type whose declaration this symbol dispatches to statically;
        /// virtual methods still resolve on the instance's dynamic type.
        declared_by: String,
    },
    Destructor,
}

/// One entry of the flat C function table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportedSymbol {
    pub name: String,
    pub role: SymbolRole,
    /// Boundary parameters, including the leading `self` handle where present.
    pub params: Vec<CType>,
    /// Boundary return type (`void` already replaced by a status code).
    pub returns: CType,
}

impl ExportedSymbol {
    fn prototype(&self) -> String {
        let params = if self.params.is_empty() {
            "void".to_string()
        } else {
            self.params
                .iter()
                .enumerate()
                .map(|(i, ty)| match (i, ty) {
                    (0, CType::Handle(_)) => format!("{} self", ty.c_name()),
                    _ => format!("{} arg{}", ty.c_name(), i),
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("{} {}({});", self.returns.c_name(), self.name, params)
    }
}

/// The generated triple for one exposed type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    pub constructor: ExportedSymbol,
    pub methods: Vec<ExportedSymbol>,
    pub destructor: ExportedSymbol,
}

impl Binding {
    /// Constructor, then methods in declaration order, then destructor.
    pub fn symbols(&self) -> impl Iterator<Item = &ExportedSymbol> {
        std::iter::once(&self.constructor)
            .chain(self.methods.iter())
            .chain(std::iter::once(&self.destructor))
    }

    pub fn method(&self, method: &str) -> Option<&ExportedSymbol> {
        self.methods.iter().find(|s| match &s.role {
            SymbolRole::Method { method: m, .. } => m == method,
            _ => false,
        })
    }
}

/// The complete exported symbol table, one `Binding` per exposed type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    pub bindings: Vec<Binding>,
}

impl BindingTable {
    pub fn binding(&self, type_name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.type_name == type_name)
    }

    /// Every exported symbol name, in table order.
    pub fn symbols(&self) -> Vec<&str> {
        self.bindings
            .iter()
            .flat_map(|b| b.symbols())
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn to_json(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Renders a self-contained C header with a prototype per exported symbol.
    /// Every handle is an untyped `void*`, so a handle from `Cat_new` can be
    /// passed to `Animal_eat` without a cast in C or C++.
    pub fn render_c_header(&self) -> String {
        let mut out = String::new();
        // `fmt::Write` into a `String` cannot fail.
        let _ = writeln!(
            out,
            "/* Generated by animal-bridge {}. Do not edit. */",
            crate::VERSION
        );
        out.push_str("#ifndef ANIMAL_BRIDGE_H\n#define ANIMAL_BRIDGE_H\n\n");
        out.push_str("#include <stdbool.h>\n#include <stddef.h>\n#include <stdint.h>\n\n");
        out.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");

        out.push_str("/* Handles are opaque: never dereference them, only pass them back. */\n");

        for binding in &self.bindings {
            match &binding.base {
                Some(base) => {
                    let _ = writeln!(out, "\n/* {} : {} */", binding.type_name, base);
                }
                None => {
                    let _ = writeln!(out, "\n/* {} */", binding.type_name);
                }
            }
            for symbol in binding.symbols() {
                out.push_str(&symbol.prototype());
                out.push('\n');
            }
        }

        out.push_str("\n/* Runtime support */\n");
        for prototype in SUPPORT_PROTOTYPES {
            out.push_str(prototype);
            out.push('\n');
        }

        out.push_str("\n#ifdef __cplusplus\n}\n#endif\n\n#endif /* ANIMAL_BRIDGE_H */\n");
        out
    }
}

/// A method after override resolution along one type's base chain.
struct ResolvedMethod {
    sig: MethodSig,
    declared_by: String,
    declared_here: bool,
}

/// Generates the binding table for `types`, in input order.
pub fn generate(types: &[ExposedType], config: &BridgeConfig) -> Result<BindingTable, BridgeError> {
    let mut by_name: HashMap<&str, &ExposedType> = HashMap::with_capacity(types.len());
    for ty in types {
        if !naming::is_c_identifier(&ty.name) {
            return Err(BridgeError::InvalidIdentifier(ty.name.clone()));
        }
        if by_name.insert(ty.name.as_str(), ty).is_some() {
            return Err(BridgeError::DuplicateType(ty.name.clone()));
        }
        if let Some(bad) = ty.methods.iter().find(|m| !naming::is_c_identifier(&m.name)) {
            return Err(BridgeError::InvalidIdentifier(bad.name.clone()));
        }
    }

    let mut exported: HashMap<String, String> = HashMap::new();
    let mut bindings = Vec::with_capacity(types.len());

    for ty in types {
        let chain = base_chain(ty, &by_name)?;
        let methods = resolve_methods(ty, &chain)?;

        let handle = CType::Handle(ty.name.clone());
        let constructor = ExportedSymbol {
            name: naming::constructor_symbol(&ty.name),
            role: SymbolRole::Constructor,
            params: Vec::new(),
            returns: handle.clone(),
        };
        let destructor = ExportedSymbol {
            name: naming::destructor_symbol(&ty.name),
            role: SymbolRole::Destructor,
            params: vec![handle.clone()],
            returns: CType::Status,
        };

        let method_symbols: Vec<ExportedSymbol> = methods
            .into_iter()
            .filter(|m| m.declared_here || config.emit_inherited_methods)
            .map(|m| {
                let mut params = Vec::with_capacity(m.sig.params.len() + 1);
                params.push(handle.clone());
                params.extend(m.sig.params.iter().cloned());
                ExportedSymbol {
                    name: naming::method_symbol(&ty.name, &m.sig.name, m.sig.kind),
                    role: SymbolRole::Method {
                        method: m.sig.name.clone(),
                        kind: m.sig.kind,
                        declared_by: m.declared_by,
                    },
                    params,
                    returns: m.sig.returns.at_boundary(),
                }
            })
            .collect();

        let binding = Binding {
            type_name: ty.name.clone(),
            base: ty.base.clone(),
            constructor,
            methods: method_symbols,
            destructor,
        };

        for symbol in binding.symbols() {
            if let Some(owner) = exported.insert(symbol.name.clone(), ty.name.clone()) {
                return Err(BridgeError::NameCollision {
                    symbol: symbol.name.clone(),
                    reason: format!("already exported for type `{}`", owner),
                });
            }
        }
        bindings.push(binding);
    }

    Ok(BindingTable { bindings })
}

/// Returns `ty`'s ancestors ordered root first, `ty` itself last.
fn base_chain<'a>(
    ty: &'a ExposedType,
    by_name: &HashMap<&str, &'a ExposedType>,
) -> Result<Vec<&'a ExposedType>, BridgeError> {
    let mut chain = vec![ty];
    let mut seen: HashSet<&str> = HashSet::from([ty.name.as_str()]);
    let mut current = ty;

    while let Some(base_name) = &current.base {
        let base = by_name
            .get(base_name.as_str())
            .copied()
            .ok_or_else(|| BridgeError::UnknownBaseType {
                ty: current.name.clone(),
                base: base_name.clone(),
            })?;
        if !seen.insert(base.name.as_str()) {
            return Err(BridgeError::InheritanceCycle(ty.name.clone()));
        }
        chain.push(base);
        current = base;
    }

    chain.reverse();
    Ok(chain)
}

fn resolve_methods(
    ty: &ExposedType,
    chain: &[&ExposedType],
) -> Result<Vec<ResolvedMethod>, BridgeError> {
    let mut resolved: Vec<ResolvedMethod> = Vec::new();

    for ancestor in chain {
        let is_self = ancestor.name == ty.name;
        let mut declared_on_ancestor: HashSet<&str> = HashSet::new();

        for sig in &ancestor.methods {
            let symbol = naming::method_symbol(&ty.name, &sig.name, sig.kind);

            if sig.name == naming::CONSTRUCTOR_NAME || sig.name == naming::DESTRUCTOR_NAME {
                return Err(BridgeError::NameCollision {
                    symbol,
                    reason: format!("method `{}` shadows a lifecycle operation", sig.name),
                });
            }
            if !declared_on_ancestor.insert(sig.name.as_str()) {
                return Err(BridgeError::NameCollision {
                    symbol,
                    reason: format!("`{}` declared twice on `{}`", sig.name, ancestor.name),
                });
            }

            match resolved.iter().position(|m| m.sig.name == sig.name) {
                Some(position) => {
                    let existing = &mut resolved[position];
                    let overridable = existing.sig.kind == MethodKind::Virtual
                        && sig.kind != MethodKind::Operator
                        && existing.sig.same_signature(sig);
                    if !overridable {
                        return Err(BridgeError::NameCollision {
                            symbol,
                            reason: format!(
                                "`{}` on `{}` does not override `{}`'s declaration",
                                sig.name, ancestor.name, existing.declared_by
                            ),
                        });
                    }
                    existing.declared_by = ancestor.name.clone();
                    existing.declared_here = is_self;
                }
                None => resolved.push(ResolvedMethod {
                    sig: sig.clone(),
                    declared_by: ancestor.name.clone(),
                    declared_here: is_self,
                }),
            }
        }
    }

    Ok(resolved)
}
