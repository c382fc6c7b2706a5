//! Hash-consed type table
//!
//! Types are interned structurally: building the same type twice yields
//! the same `TypeId`. Scalar and uninterpreted types are nominal and get
//! a fresh serial on every creation. The table also keeps the type and
//! macro name registries; a name maps to a stack of entries so that a
//! later registration shadows an earlier one and removal restores it.

use hashbrown::HashMap;

use crate::bvconst::MAX_BV_WIDTH;
use crate::error::{CoreError, CoreResult};

/// A type handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

/// A type-macro handle (named type constructor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacroId(pub u32);

/// Structure of a type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// Boolean
    Bool,
    /// Mathematical integers
    Int,
    /// Mathematical reals
    Real,
    /// Bit-vectors of the given width
    BitVec(u32),
    /// Finite scalar type with `size` elements; nominal
    Scalar { serial: u32, size: u32 },
    /// Uninterpreted type; nominal
    Uninterpreted { serial: u32 },
    /// Type variable (for macro bodies and polymorphic declarations)
    Var { index: u32 },
    /// Tuple type
    Tuple(Vec<TypeId>),
    /// Function type
    Fun { domain: Vec<TypeId>, range: TypeId },
    /// Application of a type macro to arguments
    Instance { mac: MacroId, args: Vec<TypeId> },
}

/// A type macro: an abstract constructor of the given arity
#[derive(Debug, Clone)]
pub struct MacroDef {
    /// Constructor name
    pub name: String,
    /// Number of type arguments
    pub arity: u32,
}

/// The type table
pub struct TypeStore {
    data: Vec<TypeData>,
    interned: HashMap<TypeData, TypeId>,
    macros: Vec<MacroDef>,
    names: HashMap<String, Vec<TypeId>>,
    macro_names: HashMap<String, Vec<MacroId>>,
    next_serial: u32,
    bool_id: TypeId,
    int_id: TypeId,
    real_id: TypeId,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeStore {
    /// Create a table with the primitive types pre-interned
    #[must_use]
    pub fn new() -> Self {
        let mut store = TypeStore {
            data: Vec::new(),
            interned: HashMap::new(),
            macros: Vec::new(),
            names: HashMap::new(),
            macro_names: HashMap::new(),
            next_serial: 0,
            bool_id: TypeId(0),
            int_id: TypeId(0),
            real_id: TypeId(0),
        };
        store.bool_id = store.intern(TypeData::Bool);
        store.int_id = store.intern(TypeData::Int);
        store.real_id = store.intern(TypeData::Real);
        store
    }

    fn intern(&mut self, data: TypeData) -> TypeId {
        if let Some(&id) = self.interned.get(&data) {
            return id;
        }
        let id = TypeId(self.data.len() as u32);
        self.data.push(data.clone());
        self.interned.insert(data, id);
        id
    }

    fn fresh(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.data.len() as u32);
        self.data.push(data);
        id
    }

    /// Structure of `ty`
    #[must_use]
    pub fn get(&self, ty: TypeId) -> &TypeData {
        &self.data[ty.0 as usize]
    }

    /// The Boolean type
    #[inline]
    #[must_use]
    pub fn bool_type(&self) -> TypeId {
        self.bool_id
    }

    /// The integer type
    #[inline]
    #[must_use]
    pub fn int_type(&self) -> TypeId {
        self.int_id
    }

    /// The real type
    #[inline]
    #[must_use]
    pub fn real_type(&self) -> TypeId {
        self.real_id
    }

    /// Bit-vector type of the given width
    ///
    /// # Errors
    ///
    /// Fails if `width` is zero or larger than [`MAX_BV_WIDTH`].
    pub fn mk_bitvec(&mut self, width: u32) -> CoreResult<TypeId> {
        if width == 0 || width > MAX_BV_WIDTH {
            return Err(CoreError::InvalidBvWidth(u64::from(width)));
        }
        Ok(self.intern(TypeData::BitVec(width)))
    }

    /// Fresh scalar type with `size` elements
    pub fn mk_scalar(&mut self, size: u32) -> TypeId {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.fresh(TypeData::Scalar { serial, size })
    }

    /// Fresh uninterpreted type
    pub fn mk_uninterpreted(&mut self) -> TypeId {
        let serial = self.next_serial;
        self.next_serial += 1;
        self.fresh(TypeData::Uninterpreted { serial })
    }

    /// Type variable with the given index (interned by index)
    pub fn mk_type_var(&mut self, index: u32) -> TypeId {
        self.intern(TypeData::Var { index })
    }

    /// Tuple type
    ///
    /// # Errors
    ///
    /// Fails on an empty component list.
    pub fn mk_tuple(&mut self, components: Vec<TypeId>) -> CoreResult<TypeId> {
        if components.is_empty() {
            return Err(CoreError::EmptyArguments);
        }
        Ok(self.intern(TypeData::Tuple(components)))
    }

    /// Function type
    ///
    /// # Errors
    ///
    /// Fails on an empty domain.
    pub fn mk_fun(&mut self, domain: Vec<TypeId>, range: TypeId) -> CoreResult<TypeId> {
        if domain.is_empty() {
            return Err(CoreError::EmptyArguments);
        }
        Ok(self.intern(TypeData::Fun { domain, range }))
    }

    /// Declare a type macro (abstract constructor) and register its name
    pub fn declare_macro(&mut self, name: &str, arity: u32) -> MacroId {
        let id = MacroId(self.macros.len() as u32);
        self.macros.push(MacroDef {
            name: name.to_string(),
            arity,
        });
        self.macro_names
            .entry(name.to_string())
            .or_default()
            .push(id);
        id
    }

    /// Macro definition
    #[must_use]
    pub fn macro_def(&self, mac: MacroId) -> &MacroDef {
        &self.macros[mac.0 as usize]
    }

    /// Instantiate a macro
    ///
    /// # Errors
    ///
    /// Fails when the argument count does not match the macro's arity.
    pub fn mk_instance(&mut self, mac: MacroId, args: Vec<TypeId>) -> CoreResult<TypeId> {
        let arity = self.macro_def(mac).arity;
        if args.len() != arity as usize {
            return Err(CoreError::MacroArityMismatch {
                expected: arity,
                actual: args.len(),
            });
        }
        Ok(self.intern(TypeData::Instance { mac, args }))
    }

    /// Width of a bit-vector type, `None` otherwise
    #[must_use]
    pub fn bv_width(&self, ty: TypeId) -> Option<u32> {
        match self.get(ty) {
            TypeData::BitVec(w) => Some(*w),
            _ => None,
        }
    }

    /// Whether `ty` is Int or Real
    #[must_use]
    pub fn is_arith(&self, ty: TypeId) -> bool {
        ty == self.int_id || ty == self.real_id
    }

    /// Subtype test: reflexive, Int <: Real, tuples covariant,
    /// functions with equal domains and covariant range
    #[must_use]
    pub fn is_subtype(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        match (self.get(a), self.get(b)) {
            (TypeData::Int, TypeData::Real) => true,
            (TypeData::Tuple(xs), TypeData::Tuple(ys)) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|(&x, &y)| self.is_subtype(x, y))
            }
            (
                TypeData::Fun {
                    domain: da,
                    range: ra,
                },
                TypeData::Fun {
                    domain: db,
                    range: rb,
                },
            ) => da == db && self.is_subtype(*ra, *rb),
            _ => false,
        }
    }

    /// Least common supertype of `a` and `b`, when one exists
    pub fn super_type(&mut self, a: TypeId, b: TypeId) -> Option<TypeId> {
        if a == b {
            return Some(a);
        }
        if self.is_arith(a) && self.is_arith(b) {
            return Some(self.real_id);
        }
        match (self.get(a).clone(), self.get(b).clone()) {
            (TypeData::Tuple(xs), TypeData::Tuple(ys)) if xs.len() == ys.len() => {
                let mut sup = Vec::with_capacity(xs.len());
                for (&x, &y) in xs.iter().zip(&ys) {
                    sup.push(self.super_type(x, y)?);
                }
                self.mk_tuple(sup).ok()
            }
            (
                TypeData::Fun {
                    domain: da,
                    range: ra,
                },
                TypeData::Fun {
                    domain: db,
                    range: rb,
                },
            ) if da == db => {
                let range = self.super_type(ra, rb)?;
                self.mk_fun(da, range).ok()
            }
            _ => None,
        }
    }

    /// Whether `a` and `b` have a common supertype
    pub fn compatible(&mut self, a: TypeId, b: TypeId) -> bool {
        self.super_type(a, b).is_some()
    }

    /// Register `name -> ty`, shadowing any previous registration
    pub fn set_name(&mut self, name: &str, ty: TypeId) {
        self.names.entry(name.to_string()).or_default().push(ty);
    }

    /// Current type registered under `name`
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).and_then(|stack| stack.last().copied())
    }

    /// Remove the current registration of `name`, restoring what it shadowed
    pub fn remove_name(&mut self, name: &str) {
        if let Some(stack) = self.names.get_mut(name) {
            stack.pop();
            if stack.is_empty() {
                self.names.remove(name);
            }
        }
    }

    /// Current macro registered under `name`
    #[must_use]
    pub fn macro_by_name(&self, name: &str) -> Option<MacroId> {
        self.macro_names
            .get(name)
            .and_then(|stack| stack.last().copied())
    }

    /// Remove the current macro registration of `name`
    pub fn remove_macro_name(&mut self, name: &str) {
        if let Some(stack) = self.macro_names.get_mut(name) {
            stack.pop();
            if stack.is_empty() {
                self.macro_names.remove(name);
            }
        }
    }
}
