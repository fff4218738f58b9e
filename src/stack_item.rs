//! The tagged-variant value model shared by every stack in the engine.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use num_bigint::{BigInt, Sign};
use num_traits::{ToPrimitive, Zero};

use crate::error::{VmError, VmResult};

/// An opaque host handle. Only equality-comparable, as specified.
pub trait InteropInterface: fmt::Debug {
    fn interface_type(&self) -> &str;
    fn equals(&self, other: &dyn InteropInterface) -> bool;
}

pub type ArrayRef = Rc<RefCell<Vec<StackItem>>>;
pub type MapRef = Rc<RefCell<Vec<(StackItem, StackItem)>>>;

#[derive(Clone)]
pub enum StackItem {
    Boolean(bool),
    Integer(BigInt),
    ByteArray(Rc<Vec<u8>>),
    Array(ArrayRef),
    Struct(ArrayRef),
    Map(MapRef),
    InteropInterface(Rc<dyn InteropInterface>),
}

impl fmt::Debug for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackItem::Boolean(b) => write!(f, "Boolean({b})"),
            StackItem::Integer(i) => write!(f, "Integer({i})"),
            StackItem::ByteArray(b) => write!(f, "ByteArray({} bytes)", b.len()),
            StackItem::Array(a) => write!(f, "Array({} items)", a.borrow().len()),
            StackItem::Struct(a) => write!(f, "Struct({} items)", a.borrow().len()),
            StackItem::Map(m) => write!(f, "Map({} entries)", m.borrow().len()),
            StackItem::InteropInterface(i) => write!(f, "InteropInterface({})", i.interface_type()),
        }
    }
}

/// Maximum two's-complement byte length an Integer may be constructed with.
pub const MAX_SIZE_FOR_BIG_INTEGER: usize = 32;
/// Maximum byte length of a ByteArray (or CAT result).
pub const MAX_ITEM_SIZE: usize = 1024 * 1024;
/// Maximum element count of an Array/Struct/Map produced by a single grow.
pub const MAX_ARRAY_SIZE: usize = 1024;

/// Encode a BigInt as canonical minimal two's-complement little-endian bytes.
pub fn bigint_to_bytes(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        return Vec::new();
    }
    let (sign, mut magnitude) = value.to_bytes_le();
    match sign {
        Sign::Plus => {
            // Pad with a zero byte if the top bit is set, so the value
            // doesn't read back as negative.
            if let Some(&last) = magnitude.last() {
                if last & 0x80 != 0 {
                    magnitude.push(0);
                }
            }
            magnitude
        }
        Sign::Minus => {
            // Two's complement: invert magnitude bytes (after padding so the
            // sign bit lands correctly) and add one.
            if let Some(&last) = magnitude.last() {
                if last & 0x80 == 0 {
                    // no padding needed; fits without ambiguity
                } else {
                    magnitude.push(0);
                }
            }
            let mut carry = 1u16;
            for byte in magnitude.iter_mut() {
                let inverted = (!*byte) as u16 + carry;
                *byte = inverted as u8;
                carry = inverted >> 8;
            }
            magnitude
        }
        Sign::NoSign => Vec::new(),
    }
}

/// Decode canonical two's-complement little-endian bytes into a BigInt.
pub fn bytes_to_bigint(bytes: &[u8]) -> BigInt {
    if bytes.is_empty() {
        return BigInt::zero();
    }
    let negative = bytes.last().map(|b| b & 0x80 != 0).unwrap_or(false);
    if !negative {
        return BigInt::from_bytes_le(Sign::Plus, bytes);
    }
    // Two's complement decode: subtract one, invert, negate.
    let mut buf = bytes.to_vec();
    let mut borrow = 1i16;
    for byte in buf.iter_mut() {
        let v = *byte as i16 - borrow;
        if v < 0 {
            *byte = (v + 256) as u8;
            borrow = 1;
        } else {
            *byte = v as u8;
            borrow = 0;
        }
    }
    for byte in buf.iter_mut() {
        *byte = !*byte;
    }
    -BigInt::from_bytes_le(Sign::Plus, &buf)
}

/// Recursive item count of a single value, as added to `RandomAccessStack`'s
/// total-size bound by `Push`/`Set`/`Insert`. The floor-at-1 rule applies
/// once, to the whole pushed value, not to every nested collection: an
/// empty Array nested inside a non-empty Array contributes 0, and only the
/// outermost call floors its result.
pub fn item_count(item: &StackItem) -> usize {
    raw_item_count(item, &mut Vec::new(), 0).max(1)
}

/// Recursive item count of a batch of values copied together (as in
/// `RandomAccessStack::copy_to`), floored at 1 as a whole rather than per
/// element.
pub fn batch_item_count(items: &[StackItem]) -> usize {
    let sum: usize = items.iter().map(|i| raw_item_count(i, &mut Vec::new(), 0)).sum();
    sum.max(1)
}

const MAX_ITEM_COUNT_DEPTH: usize = 64;

fn raw_item_count(item: &StackItem, visited: &mut Vec<*const ()>, depth: usize) -> usize {
    if depth > MAX_ITEM_COUNT_DEPTH {
        return 1;
    }
    match item {
        StackItem::Array(a) | StackItem::Struct(a) => {
            let ptr = Rc::as_ptr(a) as *const ();
            if visited.contains(&ptr) {
                return 0;
            }
            visited.push(ptr);
            let items = a.borrow();
            let sum: usize = items
                .iter()
                .map(|x| raw_item_count(x, visited, depth + 1))
                .sum();
            visited.pop();
            sum
        }
        StackItem::Map(m) => {
            let ptr = Rc::as_ptr(m) as *const ();
            if visited.contains(&ptr) {
                return 0;
            }
            visited.push(ptr);
            let entries = m.borrow();
            let sum: usize = entries
                .iter()
                .map(|(_, v)| raw_item_count(v, visited, depth + 1))
                .sum();
            visited.pop();
            sum
        }
        _ => 1,
    }
}

/// Deep-clone a value with Struct (value) semantics: Struct contents are
/// recursively cloned so the result never aliases the source; Array and Map
/// retain reference (shared) semantics.
pub fn deep_clone_for_assignment(item: &StackItem) -> StackItem {
    deep_clone_guarded(item, &mut Vec::new())
}

fn deep_clone_guarded(item: &StackItem, visited: &mut Vec<*const ()>) -> StackItem {
    match item {
        StackItem::Struct(a) => {
            let ptr = Rc::as_ptr(a) as *const ();
            if visited.contains(&ptr) {
                // Cycle: break it by yielding an empty struct rather than
                // recursing forever.
                return StackItem::Struct(Rc::new(RefCell::new(Vec::new())));
            }
            visited.push(ptr);
            let cloned: Vec<StackItem> = a
                .borrow()
                .iter()
                .map(|x| deep_clone_guarded(x, visited))
                .collect();
            visited.pop();
            StackItem::Struct(Rc::new(RefCell::new(cloned)))
        }
        other => other.clone(),
    }
}

impl StackItem {
    pub fn from_bool(b: bool) -> StackItem {
        StackItem::Boolean(b)
    }

    pub fn from_int<I: Into<BigInt>>(i: I) -> StackItem {
        StackItem::Integer(i.into())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> StackItem {
        StackItem::ByteArray(Rc::new(bytes))
    }

    pub fn new_array(items: Vec<StackItem>) -> StackItem {
        StackItem::Array(Rc::new(RefCell::new(items)))
    }

    pub fn new_struct(items: Vec<StackItem>) -> StackItem {
        StackItem::Struct(Rc::new(RefCell::new(items)))
    }

    pub fn new_map() -> StackItem {
        StackItem::Map(Rc::new(RefCell::new(Vec::new())))
    }

    /// `GetBoolean()`: false iff the value is zero-equivalent.
    pub fn as_bool(&self) -> bool {
        match self {
            StackItem::Boolean(b) => *b,
            StackItem::Integer(i) => !i.is_zero(),
            StackItem::ByteArray(b) => b.iter().any(|&x| x != 0),
            StackItem::Array(a) | StackItem::Struct(a) => !a.borrow().is_empty(),
            StackItem::Map(m) => !m.borrow().is_empty(),
            StackItem::InteropInterface(_) => true,
        }
    }

    /// `GetBigInteger()`: fails if the item is a collection.
    pub fn as_bigint(&self) -> VmResult<BigInt> {
        match self {
            StackItem::Boolean(b) => Ok(BigInt::from(if *b { 1 } else { 0 })),
            StackItem::Integer(i) => Ok(i.clone()),
            StackItem::ByteArray(b) => Ok(bytes_to_bigint(b)),
            _ => Err(VmError::PickItemInvalidType),
        }
    }

    /// `GetByteArray()`: canonical two's-complement LE for Integer; empty
    /// bytes for Boolean false, `[0x01]` for Boolean true.
    pub fn as_bytes(&self) -> VmResult<Vec<u8>> {
        match self {
            StackItem::Boolean(b) => Ok(if *b { vec![1] } else { Vec::new() }),
            StackItem::Integer(i) => Ok(bigint_to_bytes(i)),
            StackItem::ByteArray(b) => Ok((**b).clone()),
            _ => Err(VmError::PickItemInvalidType),
        }
    }

    pub fn byte_len(&self) -> VmResult<usize> {
        Ok(self.as_bytes()?.len())
    }

    pub fn as_array(&self) -> VmResult<ArrayRef> {
        match self {
            StackItem::Array(a) | StackItem::Struct(a) => Ok(a.clone()),
            _ => Err(VmError::PickItemInvalidType),
        }
    }

    pub fn as_map(&self) -> VmResult<MapRef> {
        match self {
            StackItem::Map(m) => Ok(m.clone()),
            _ => Err(VmError::PickItemInvalidType),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            StackItem::Array(_) | StackItem::Struct(_) | StackItem::Map(_)
        )
    }

    /// `Equals(other)`: value equality for scalars, reference (identity)
    /// equality for collections and interop handles.
    pub fn equals(&self, other: &StackItem) -> bool {
        match (self, other) {
            (StackItem::Array(a), StackItem::Array(b)) | (StackItem::Struct(a), StackItem::Struct(b)) => {
                Rc::ptr_eq(a, b)
            }
            (StackItem::Map(a), StackItem::Map(b)) => Rc::ptr_eq(a, b),
            (StackItem::InteropInterface(a), StackItem::InteropInterface(b)) => a.equals(b.as_ref()),
            (StackItem::Array(_) | StackItem::Struct(_) | StackItem::Map(_), _) => false,
            (_, StackItem::Array(_) | StackItem::Struct(_) | StackItem::Map(_)) => false,
            (StackItem::InteropInterface(_), _) | (_, StackItem::InteropInterface(_)) => false,
            _ => {
                // Scalars compare by byte-array representation, matching the
                // source's `Equals` behavior across Boolean/Integer/ByteArray.
                match (self.as_bytes(), other.as_bytes()) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
            }
        }
    }

    pub fn to_usize(&self) -> VmResult<usize> {
        self.as_bigint()?
            .to_usize()
            .ok_or(VmError::PickItemNegativeIndex)
    }

    pub fn to_isize(&self) -> VmResult<isize> {
        self.as_bigint()?
            .to_isize()
            .ok_or(VmError::PickItemInvalidType)
    }
}
