//! Basic walkthrough: groups by absolute and relative path, a 4 × 6 integer dataset with a
//! `dimensions` attribute, and the dataset read back whole and by quadrant.

use crate::error::Result;
use crate::path::ObjectPath;
use crate::slab::{Hyperslab, Quadrant};
use crate::store::ArrayStore;
use crate::workload::DIMENSIONS;

pub const ROWS: usize = 4;
pub const COLS: usize = 6;

pub const DATA_GROUP: &str = "/DataGroup";
pub const MATRICES: &str = "/DataGroup/Matrices";
pub const MATRIX_DATA: &str = "/DataGroup/Matrices/matrix_data";

#[derive(Debug, Clone, PartialEq)]
pub struct QuadrantRead {
    pub quadrant: Quadrant,
    pub slab: Hyperslab,
    pub values: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoReport {
    /// Groups created, in order.
    pub groups: Vec<ObjectPath>,
    pub dataset: ObjectPath,
    pub shape: [usize; 2],
    pub values: Vec<i32>,
    pub quadrants: Vec<QuadrantRead>,
    pub dimensions: Vec<i32>,
}

/// Cell `(i, j)` holds `i * COLS + j + 1`.
pub fn matrix_values() -> Vec<i32> {
    (0..ROWS * COLS).map(|k| k as i32 + 1).collect()
}

/// Run the walkthrough on an empty store.
pub fn run<S: ArrayStore>(store: &S) -> Result<DemoReport> {
    let mut groups = Vec::new();

    store.create_group(DATA_GROUP, false)?;
    log::info!("created group {DATA_GROUP}");
    groups.push(ObjectPath::parse(DATA_GROUP)?);

    store.create_group(MATRICES, false)?;
    log::info!("created group {MATRICES}");
    groups.push(ObjectPath::parse(MATRICES)?);

    let attributes = store.group(DATA_GROUP)?.create_group("Attributes")?;
    log::info!("created group {} (relative to {DATA_GROUP})", attributes.path());
    groups.push(attributes.path().clone());

    let shape = [ROWS, COLS];
    let dims = [ROWS as i32, COLS as i32];
    store.put(MATRIX_DATA, &shape, &matrix_values())?;
    store.attach_attribute(MATRIX_DATA, DIMENSIONS, &dims, &[2])?;
    log::info!("wrote {MATRIX_DATA} with attribute {DIMENSIONS}");

    let values = store.read_full::<i32>(MATRIX_DATA)?;

    let quadrants = store
        .quadrants(MATRIX_DATA)?
        .into_iter()
        .map(|(quadrant, slab)| {
            let values = store.read_selection::<i32>(MATRIX_DATA, &slab)?;
            log::debug!("read {quadrant} quadrant ({slab})");
            Ok(QuadrantRead {
                quadrant,
                slab,
                values,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let dimensions = store.read_attribute::<i32>(MATRIX_DATA, DIMENSIONS)?;

    Ok(DemoReport {
        groups,
        dataset: ObjectPath::parse(MATRIX_DATA)?,
        shape,
        values,
        quadrants,
        dimensions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Entity, MemStore};

    #[test]
    fn walkthrough() {
        let store = MemStore::new();
        let report = run(&store).unwrap();

        assert_eq!(report.values, (1..=24).collect::<Vec<_>>());
        assert_eq!(report.dimensions, [4, 6]);
        assert_eq!(
            report
                .groups
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            ["/DataGroup", "/DataGroup/Matrices", "/DataGroup/Attributes"]
        );
        assert_eq!(
            store.resolve("/DataGroup/Attributes").unwrap(),
            Entity::Group
        );

        let q = &report.quadrants;
        assert_eq!(q[0].values, [1, 2, 3, 7, 8, 9]);
        assert_eq!(q[1].values, [4, 5, 6, 10, 11, 12]);
        assert_eq!(q[2].values, [13, 14, 15, 19, 20, 21]);
        assert_eq!(q[3].values, [16, 17, 18, 22, 23, 24]);
        assert_eq!(q[1].slab.offset(), [0, 3]);
        assert_eq!(q[1].slab.count(), [2, 3]);
    }

    #[test]
    fn second_run_fails() {
        let store = MemStore::new();
        run(&store).unwrap();
        assert!(run(&store).is_err());
    }
}
