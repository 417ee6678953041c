use crate::errors::ClassifyError;
use crate::extract::body_text;
use crate::model::{Classified, ClassifierRules, MachineDefinition, Record};
use crate::registry::PathGrammar;

use super::mismatch;

const MACHINES_PATH: &str = "/machines";

/// `/machines`: a machine definition (`mkey` + display `name`).
pub struct MachineCatalogGrammar;

impl Default for MachineCatalogGrammar {
    fn default() -> Self {
        Self
    }
}

impl MachineCatalogGrammar {
    const NAME: &'static str = "machine_catalog";
}

impl PathGrammar for MachineCatalogGrammar {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn classify(
        &self,
        record: &Record,
        _rules: &ClassifierRules,
    ) -> Result<Classified, ClassifyError> {
        if record.path != MACHINES_PATH {
            return Err(mismatch(Self::NAME, &record.path));
        }

        let definition = match (
            body_text(&record.body, "mkey"),
            body_text(&record.body, "name"),
        ) {
            (Some(mkey), Some(name)) => Some(MachineDefinition {
                mkey,
                name,
                meta: record.meta(),
            }),
            _ => None,
        };

        Ok(Classified::MachineCatalog(definition))
    }
}
