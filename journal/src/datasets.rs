//! Route-to-dataset resolution.
//!
//! Every gateway route journals into one dataset: a blob filename for the
//! appender and a type tag for the key-value sink. The table is built once
//! at startup from the built-in mappings plus any config overrides and is
//! immutable afterwards. Unmapped routes fall back to the `unclassified`
//! dataset; entries are persisted under the generic identifier rather than
//! dropped.

use crate::config::DatasetConfig;
use std::collections::HashMap;

/// Blob filename and key-value type tag for one query family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    pub dataset_id: String,
    pub kind: String,
}

/// Route table carried over from the gateway's query families. The kind is
/// the filename stem.
const BUILTIN_DATASETS: &[(&str, &str)] = &[
    ("/reniec", "dni.json"),
    ("/denuncias-dni", "denuncias_dni.json"),
    ("/sueldos", "sueldos.json"),
    ("/trabajos", "trabajos.json"),
    ("/sunat", "sunat_ruc.json"),
    ("/sunat-razon", "sunat_razon.json"),
    ("/consumos", "consumos.json"),
    ("/arbol", "arbol.json"),
    ("/familia1", "familia1.json"),
    ("/familia2", "familia2.json"),
    ("/familia3", "familia3.json"),
    ("/movimientos", "movimientos.json"),
    ("/matrimonios", "matrimonios.json"),
    ("/empresas", "empresas.json"),
    ("/direcciones", "direcciones.json"),
    ("/correos", "correos.json"),
    ("/telefonia-doc", "telefonia_documento.json"),
    ("/telefonia-num", "telefonia_numero.json"),
    ("/vehiculos", "vehiculos.json"),
    ("/fiscalia-dni", "fiscalia_dni.json"),
    ("/fiscalia-nombres", "fiscalia_nombres.json"),
    ("/denuncias-placa", "denuncias_placa.json"),
];

const UNCLASSIFIED_FILE: &str = "unclassified.json";

#[derive(Debug, Clone)]
pub struct DatasetTable {
    routes: HashMap<String, DatasetDescriptor>,
    unclassified: DatasetDescriptor,
}

impl DatasetTable {
    /// Build the table from the built-in mappings plus config overrides.
    /// Overrides win on route collisions.
    pub fn new(overrides: &HashMap<String, DatasetConfig>) -> Self {
        let mut routes: HashMap<String, DatasetDescriptor> = BUILTIN_DATASETS
            .iter()
            .map(|(route, file)| {
                (
                    route.to_string(),
                    DatasetDescriptor {
                        dataset_id: file.to_string(),
                        kind: file.trim_end_matches(".json").to_string(),
                    },
                )
            })
            .collect();

        for (route, dataset) in overrides {
            routes.insert(
                route.clone(),
                DatasetDescriptor {
                    dataset_id: dataset.file.clone(),
                    kind: dataset.kind.clone(),
                },
            );
        }

        DatasetTable {
            routes,
            unclassified: DatasetDescriptor {
                dataset_id: UNCLASSIFIED_FILE.to_string(),
                kind: "unclassified".to_string(),
            },
        }
    }

    pub fn builtin() -> Self {
        Self::new(&HashMap::new())
    }

    /// Resolve a route to its dataset. Unmapped routes get the sentinel
    /// descriptor instead of an error.
    pub fn resolve(&self, route: &str) -> &DatasetDescriptor {
        self.routes.get(route).unwrap_or(&self.unclassified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_routes_resolve() {
        let table = DatasetTable::builtin();

        let descriptor = table.resolve("/reniec");
        assert_eq!(descriptor.dataset_id, "dni.json");
        assert_eq!(descriptor.kind, "dni");

        let descriptor = table.resolve("/telefonia-doc");
        assert_eq!(descriptor.dataset_id, "telefonia_documento.json");
        assert_eq!(descriptor.kind, "telefonia_documento");
    }

    #[test]
    fn test_unmapped_route_gets_sentinel() {
        let table = DatasetTable::builtin();

        let descriptor = table.resolve("/not-a-route");
        assert_eq!(descriptor.dataset_id, "unclassified.json");
        assert_eq!(descriptor.kind, "unclassified");
    }

    #[test]
    fn test_overrides_extend_and_replace() {
        let overrides = HashMap::from([
            (
                "/reniec".to_string(),
                DatasetConfig {
                    file: "reniec_v2.json".into(),
                    kind: "reniec".into(),
                },
            ),
            (
                "/nuevo".to_string(),
                DatasetConfig {
                    file: "nuevo.json".into(),
                    kind: "nuevo".into(),
                },
            ),
        ]);

        let table = DatasetTable::new(&overrides);

        assert_eq!(table.resolve("/reniec").dataset_id, "reniec_v2.json");
        assert_eq!(table.resolve("/nuevo").kind, "nuevo");
        // Untouched builtin entries survive
        assert_eq!(table.resolve("/sunat").dataset_id, "sunat_ruc.json");
    }
}
