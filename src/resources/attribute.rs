//! Per-vertex attribute columns

use crate::gl::ScalarType;
use crate::resources::BufferError;
use parking_lot::Mutex;

/// One named, typed column of per-vertex data
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    name: String,
    scalar: ScalarType,
    components: u32,
    data: Vec<u8>,
}

impl Attribute {
    /// Create an attribute from raw packed bytes
    pub fn new(name: &str, scalar: ScalarType, components: u32, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            scalar,
            components,
            data,
        }
    }

    pub fn from_f32(name: &str, components: u32, values: &[f32]) -> Self {
        Self::new(
            name,
            ScalarType::Float,
            components,
            bytemuck::cast_slice(values).to_vec(),
        )
    }

    pub fn from_i32(name: &str, components: u32, values: &[i32]) -> Self {
        Self::new(
            name,
            ScalarType::Int,
            components,
            bytemuck::cast_slice(values).to_vec(),
        )
    }

    pub fn from_f64(name: &str, components: u32, values: &[f64]) -> Self {
        Self::new(
            name,
            ScalarType::Double,
            components,
            bytemuck::cast_slice(values).to_vec(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.scalar
    }

    pub fn components(&self) -> u32 {
        self.components
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Bytes per datapoint
    pub fn stride(&self) -> usize {
        self.components as usize * self.scalar.size()
    }

    /// Number of whole datapoints held
    pub fn datapoint_count(&self) -> usize {
        match self.stride() {
            0 => 0,
            stride => self.data.len() / stride,
        }
    }

    /// Whether the byte buffer holds a whole number of valid datapoints
    pub fn is_aligned(&self) -> bool {
        (1..=4).contains(&self.components) && self.data.len() % self.stride() == 0
    }

    fn append_bytes(&mut self, scalar: ScalarType, bytes: &[u8]) -> Result<(), BufferError> {
        if scalar != self.scalar {
            return Err(BufferError::ScalarMismatch {
                name: self.name.clone(),
                expected: self.scalar,
                actual: scalar,
            });
        }
        self.data.extend_from_slice(bytes);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct StorageInner {
    attributes: Vec<Attribute>,
    sealed: bool,
}

impl StorageInner {
    fn is_aligned(&self) -> bool {
        let Some(first) = self.attributes.first() else {
            return false;
        };
        let count = first.datapoint_count();
        self.attributes
            .iter()
            .all(|a| a.is_aligned() && a.datapoint_count() == count)
    }
}

/// Ordered set of attributes uploaded together into one vertex buffer.
///
/// Insertion order defines the attribute slot on the GPU. Every operation
/// takes the internal lock for its own duration only, so a worker thread can
/// populate a storage while the render thread works with another one. Once a
/// vertex buffer has consumed the storage it is sealed and rejects mutation.
#[derive(Debug, Default)]
pub struct AttributeStorage {
    inner: Mutex<StorageInner>,
}

impl AttributeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute. Returns false on a name collision or when sealed.
    pub fn add_attribute(&self, attribute: Attribute) -> bool {
        let mut inner = self.inner.lock();
        if inner.sealed {
            log::warn!(
                "Rejected attribute '{}': storage is sealed",
                attribute.name()
            );
            return false;
        }
        if inner.attributes.iter().any(|a| a.name == attribute.name) {
            return false;
        }
        inner.attributes.push(attribute);
        true
    }

    /// Remove an attribute by name, returning it
    pub fn remove_attribute(&self, name: &str) -> Option<Attribute> {
        let mut inner = self.inner.lock();
        if inner.sealed {
            return None;
        }
        let index = inner.attributes.iter().position(|a| a.name == name)?;
        Some(inner.attributes.remove(index))
    }

    /// Copy of the named attribute
    pub fn attribute(&self, name: &str) -> Option<Attribute> {
        self.inner
            .lock()
            .attributes
            .iter()
            .find(|a| a.name == name)
            .cloned()
    }

    pub fn append_f32(&self, name: &str, values: &[f32]) -> Result<(), BufferError> {
        self.append(name, ScalarType::Float, bytemuck::cast_slice(values))
    }

    pub fn append_i32(&self, name: &str, values: &[i32]) -> Result<(), BufferError> {
        self.append(name, ScalarType::Int, bytemuck::cast_slice(values))
    }

    pub fn append_f64(&self, name: &str, values: &[f64]) -> Result<(), BufferError> {
        self.append(name, ScalarType::Double, bytemuck::cast_slice(values))
    }

    fn append(&self, name: &str, scalar: ScalarType, bytes: &[u8]) -> Result<(), BufferError> {
        let mut inner = self.inner.lock();
        if inner.sealed {
            return Err(BufferError::StorageSealed);
        }
        inner
            .attributes
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| BufferError::UnknownAttribute(name.to_string()))?
            .append_bytes(scalar, bytes)
    }

    /// True iff the storage is non-empty, every attribute holds whole
    /// datapoints and all attributes agree on the datapoint count
    pub fn validate_data_alignment(&self) -> bool {
        self.inner.lock().is_aligned()
    }

    pub fn total_byte_count(&self) -> usize {
        self.inner.lock().attributes.iter().map(|a| a.byte_len()).sum()
    }

    /// Datapoint count of the first attribute
    pub fn datapoint_count(&self) -> Option<usize> {
        self.inner
            .lock()
            .attributes
            .first()
            .map(|a| a.datapoint_count())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().attributes.is_empty()
    }

    /// Attribute names in slot order
    pub fn names(&self) -> Vec<String> {
        self.inner
            .lock()
            .attributes
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }

    pub fn seal(&self) {
        self.inner.lock().sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.lock().sealed
    }

    /// Validate alignment, seal and run `f` over the attributes under one
    /// lock. Returns `None` and leaves the storage open when misaligned.
    pub fn seal_aligned<R>(&self, f: impl FnOnce(&[Attribute]) -> R) -> Option<R> {
        let mut inner = self.inner.lock();
        if !inner.is_aligned() {
            return None;
        }
        inner.sealed = true;
        Some(f(&inner.attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_datapoint_count() {
        let position = Attribute::from_f32("position", 3, &[0.0; 9]);
        assert_eq!(position.stride(), 12);
        assert_eq!(position.datapoint_count(), 3);
        assert!(position.is_aligned());

        let weights = Attribute::from_f64("weights", 2, &[0.0; 4]);
        assert_eq!(weights.stride(), 16);
        assert_eq!(weights.datapoint_count(), 2);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let storage = AttributeStorage::new();
        assert!(storage.add_attribute(Attribute::from_f32("position", 3, &[0.0; 3])));
        assert!(!storage.add_attribute(Attribute::from_f32("position", 2, &[0.0; 2])));
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.attribute("position").map(|a| a.components()), Some(3));
    }

    #[test]
    fn test_alignment_requires_equal_counts() {
        let storage = AttributeStorage::new();
        storage.add_attribute(Attribute::from_f32("position", 3, &[0.0; 9]));
        storage.add_attribute(Attribute::from_f32("uv", 2, &[0.0; 6]));
        assert!(storage.validate_data_alignment());

        storage.add_attribute(Attribute::from_f32("normal", 3, &[0.0; 6]));
        assert!(!storage.validate_data_alignment());

        storage.remove_attribute("normal");
        assert!(storage.validate_data_alignment());
        assert_eq!(storage.total_byte_count(), 9 * 4 + 6 * 4);
    }

    #[test]
    fn test_partial_datapoint_is_misaligned() {
        let storage = AttributeStorage::new();
        storage.add_attribute(Attribute::new("position", ScalarType::Float, 3, vec![0; 14]));
        assert!(!storage.validate_data_alignment());
    }

    #[test]
    fn test_empty_storage_is_not_aligned() {
        assert!(!AttributeStorage::new().validate_data_alignment());
    }

    #[test]
    fn test_sealed_storage_rejects_mutation() {
        let storage = AttributeStorage::new();
        storage.add_attribute(Attribute::from_f32("position", 3, &[]));
        storage.seal();

        assert!(!storage.add_attribute(Attribute::from_f32("uv", 2, &[])));
        assert!(storage.remove_attribute("position").is_none());
        assert_eq!(
            storage.append_f32("position", &[1.0, 2.0, 3.0]),
            Err(BufferError::StorageSealed)
        );
    }

    #[test]
    fn test_seal_aligned_only_seals_on_success() {
        let storage = AttributeStorage::new();
        storage.add_attribute(Attribute::from_f32("position", 3, &[0.0; 9]));
        storage.add_attribute(Attribute::from_f32("uv", 2, &[0.0; 4]));

        assert_eq!(storage.seal_aligned(|attributes| attributes.len()), None);
        assert!(!storage.is_sealed());

        storage.append_f32("uv", &[0.0, 0.0]).unwrap();
        assert_eq!(
            storage.seal_aligned(|attributes| attributes[0].datapoint_count()),
            Some(3)
        );
        assert!(storage.is_sealed());
        assert_eq!(
            storage.append_f32("position", &[1.0]),
            Err(BufferError::StorageSealed)
        );
    }

    #[test]
    fn test_seal_aligned_against_concurrent_append() {
        for _ in 0..50 {
            let storage = Arc::new(AttributeStorage::new());
            storage.add_attribute(Attribute::from_f32("position", 3, &[0.0; 9]));

            let appender = {
                let storage = Arc::clone(&storage);
                std::thread::spawn(move || {
                    while storage.append_f32("position", &[1.0]).is_ok() {}
                })
            };
            // Every snapshot handed out is whole, and nothing lands after it
            let sealed = loop {
                if let Some(bytes) = storage.seal_aligned(|a| a[0].byte_len()) {
                    break bytes;
                }
            };
            appender.join().expect("appender panicked");

            assert_eq!(sealed % 12, 0);
            assert_eq!(storage.total_byte_count(), sealed);
        }
    }

    #[test]
    fn test_append_checks_scalar_type() {
        let storage = AttributeStorage::new();
        storage.add_attribute(Attribute::from_f32("position", 3, &[]));
        assert!(storage.append_f32("position", &[1.0, 2.0, 3.0]).is_ok());
        assert!(matches!(
            storage.append_i32("position", &[1]),
            Err(BufferError::ScalarMismatch { .. })
        ));
        assert_eq!(
            storage.append_f32("missing", &[1.0]),
            Err(BufferError::UnknownAttribute("missing".to_string()))
        );
    }

    #[test]
    fn test_concurrent_population() {
        let storage = Arc::new(AttributeStorage::new());
        storage.add_attribute(Attribute::from_f32("position", 3, &[]));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let storage = Arc::clone(&storage);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        storage
                            .append_f32("position", &[0.0, 1.0, 2.0])
                            .expect("append failed");
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().expect("worker panicked");
        }

        assert_eq!(storage.datapoint_count(), Some(400));
        assert!(storage.validate_data_alignment());
    }
}
