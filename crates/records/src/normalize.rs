use std::collections::BTreeMap;

use cube::{FieldDescriptor, Matrix, Row};
use tracing::{debug, info};

use crate::entity::{
    Entity, EntityFields, FieldValue, NUMERIC_SUFFIX, RawDimension, entity_id, initial_of,
};
use crate::overrides::PositionOverrides;

/// Which dimension columns carry the coordinates and display name.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub latitude: usize,
    pub longitude: usize,
    pub name: usize,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            latitude: 0,
            longitude: 1,
            name: 2,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// A coordinate or name column is out of range or empty.
    MissingCell { column: usize },
    /// Latitude or longitude is NaN or infinite.
    NonFiniteCoordinate,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DroppedRow {
    pub row: usize,
    pub reason: DropReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    /// Kept entities in source row order.
    pub entities: Vec<Entity>,
    pub dropped: Vec<DroppedRow>,
}

/// Converts matrix rows into entities.
///
/// `dimensions` describes the leading dimension block of each row; the first
/// column after it, if present, is the size measure. Rows without readable
/// coordinate and name cells, or with non-finite coordinates, are dropped
/// without failing the batch.
pub fn normalize(
    matrix: &Matrix,
    dimensions: &[FieldDescriptor],
    mapping: ColumnMapping,
    overrides: &PositionOverrides,
) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for (index, row) in matrix.rows().iter().enumerate() {
        match normalize_row(index, row, dimensions, mapping, overrides) {
            Ok(entity) => report.entities.push(entity),
            Err(reason) => {
                debug!(row = index, ?reason, "dropping row");
                report.dropped.push(DroppedRow { row: index, reason });
            }
        }
    }

    info!(
        kept = report.entities.len(),
        dropped = report.dropped.len(),
        "normalized cube rows"
    );
    report
}

fn normalize_row(
    index: usize,
    row: &Row,
    dimensions: &[FieldDescriptor],
    mapping: ColumnMapping,
    overrides: &PositionOverrides,
) -> Result<Entity, DropReason> {
    let cell = |col: usize| row.get(col).and_then(|c| c.as_ref());
    let required = |col: usize| cell(col).ok_or(DropReason::MissingCell { column: col });

    let lat_cell = required(mapping.latitude)?;
    let lng_cell = required(mapping.longitude)?;
    let name_cell = required(mapping.name)?;

    let latitude = lat_cell.numeric;
    let longitude = lng_cell.numeric;
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(DropReason::NonFiniteCoordinate);
    }

    let name = name_cell.text.clone();
    let id = entity_id(latitude, longitude, &name);

    let mut fields = EntityFields::new();
    let mut raw_dimensions = BTreeMap::new();
    for field in dimensions {
        let Some(value) = cell(field.index) else {
            continue;
        };
        raw_dimensions.insert(
            field.index,
            RawDimension {
                text: value.text.clone(),
                numeric: value.numeric,
            },
        );
        fields.set(field.safe_key.clone(), FieldValue::Text(value.text.clone()));
        if value.has_numeric() {
            fields.set(
                format!("{}{NUMERIC_SUFFIX}", field.safe_key),
                FieldValue::Number(value.numeric),
            );
        }
    }

    let (size_value, size_text) = match cell(dimensions.len()) {
        Some(measure) => (Some(measure.numeric), Some(measure.text.clone())),
        None => (None, None),
    };

    let stored_position = overrides.get(&id);

    Ok(Entity {
        initial: initial_of(&name),
        id,
        row: index,
        latitude,
        longitude,
        name,
        element: name_cell.element,
        fields,
        raw_dimensions,
        size_value,
        size_text,
        priority: 0.0,
        manually_positioned: false,
        stored_position,
    })
}

#[cfg(test)]
mod tests {
    use cube::{Cell, CubeDescriptor, Matrix};
    use foundation::{ElementId, Vec2};
    use pretty_assertions::assert_eq;

    use super::{ColumnMapping, DropReason, normalize};
    use crate::entity::FieldValue;
    use crate::overrides::PositionOverrides;

    fn row(lat: f64, lng: f64, name: &str, title: &str, sales: Option<f64>) -> Vec<Cell> {
        let mut r = vec![
            Cell::number(lat, ElementId(1)),
            Cell::number(lng, ElementId(2)),
            Cell::text(name, ElementId(3)),
            Cell::text(title, ElementId(4)),
        ];
        if let Some(s) = sales {
            r.push(Cell::number(s, ElementId::UNSELECTABLE));
        }
        r
    }

    fn descriptor() -> CubeDescriptor {
        CubeDescriptor::from_names(["Latitude", "Longitude", "Name", "Job Title"], ["Sales"], 0)
    }

    #[test]
    fn builds_fields_and_shadow_numbers() {
        let m = Matrix::from_cells(vec![row(48.85, 2.35, "paris", "Mayor", Some(12.5))]);
        let report = normalize(
            &m,
            &descriptor().dimensions,
            ColumnMapping::default(),
            &PositionOverrides::new(),
        );
        assert!(report.dropped.is_empty());
        let e = &report.entities[0];

        assert_eq!(e.id, "48.85-2.35-paris");
        assert_eq!(e.initial, "P");
        assert_eq!(e.element, ElementId(3));
        assert_eq!(e.fields.get("latitude"), Some(&FieldValue::Text("48.85".into())));
        assert_eq!(e.fields.get("latitude_num"), Some(&FieldValue::Number(48.85)));
        assert_eq!(e.fields.get("job_title"), Some(&FieldValue::Text("Mayor".into())));
        assert_eq!(e.fields.get("job_title_num"), None);
        assert_eq!(e.raw_dimensions[&3].text, "Mayor");
        assert_eq!(e.size_value, Some(12.5));
        assert_eq!(e.size_text.as_deref(), Some("12.5"));
        assert_eq!(e.stored_position, None);
    }

    #[test]
    fn drops_non_numeric_latitude_and_missing_cells() {
        let mut bad_lat = row(0.0, 0.0, "bad", "x", None);
        bad_lat[0] = Cell::text("north", ElementId(0));
        let m = Matrix::new(vec![
            row(1.0, 1.0, "a", "x", None).into_iter().map(Some).collect(),
            bad_lat.into_iter().map(Some).collect(),
            vec![Some(Cell::number(1.0, ElementId(0)))],
            row(f64::INFINITY, 1.0, "inf", "x", None)
                .into_iter()
                .map(Some)
                .collect(),
            row(2.0, 2.0, "b", "x", None).into_iter().map(Some).collect(),
        ]);
        let report = normalize(
            &m,
            &descriptor().dimensions,
            ColumnMapping::default(),
            &PositionOverrides::new(),
        );

        let names: Vec<&str> = report.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(report
            .entities
            .iter()
            .all(|e| e.latitude.is_finite() && e.longitude.is_finite()));
        assert!(report.entities.windows(2).all(|w| w[0].row <= w[1].row));

        let reasons: Vec<DropReason> = report.dropped.iter().map(|d| d.reason).collect();
        assert_eq!(
            reasons,
            vec![
                DropReason::NonFiniteCoordinate,
                DropReason::MissingCell { column: 1 },
                DropReason::NonFiniteCoordinate,
            ]
        );
    }

    #[test]
    fn missing_measure_leaves_size_unset() {
        let m = Matrix::from_cells(vec![row(1.0, 2.0, "a", "x", None)]);
        let report = normalize(
            &m,
            &descriptor().dimensions,
            ColumnMapping::default(),
            &PositionOverrides::new(),
        );
        assert_eq!(report.entities[0].size_value, None);
        assert_eq!(report.entities[0].size_text, None);
    }

    #[test]
    fn overrides_are_merged_by_id() {
        let mut overrides = PositionOverrides::new();
        overrides.set("1-2-a", Vec2::new(40.0, 60.0));
        let m = Matrix::from_cells(vec![
            row(1.0, 2.0, "a", "x", None),
            row(3.0, 4.0, "b", "x", None),
        ]);
        let report = normalize(
            &m,
            &descriptor().dimensions,
            ColumnMapping::default(),
            &overrides,
        );
        assert_eq!(report.entities[0].stored_position, Some(Vec2::new(40.0, 60.0)));
        assert_eq!(report.entities[1].stored_position, None);
        assert!(!report.entities[0].manually_positioned);
    }

    #[test]
    fn custom_mapping_and_placeholder_names() {
        let m = Matrix::from_cells(vec![vec![
            Cell::text("Oslo", ElementId(9)),
            Cell::number(59.9, ElementId(1)),
            Cell::number(10.7, ElementId(2)),
            Cell::dimension_placeholder("Job Title"),
        ]]);
        let mapping = ColumnMapping {
            latitude: 1,
            longitude: 2,
            name: 0,
        };
        let desc = CubeDescriptor::from_names(["Name", "Lat", "Lng", "Job Title"], ["Sales"], 1);
        let report = normalize(&m, &desc.dimensions, mapping, &PositionOverrides::new());
        let e = &report.entities[0];
        assert_eq!(e.name, "Oslo");
        assert_eq!(e.element, ElementId(9));
        assert_eq!(e.fields.get("job_title"), Some(&FieldValue::Text("[Job Title]".into())));
    }
}
