use std::sync::Arc;

use crate::auth::savings_model_path;
use crate::budget::{GoalField, SavingsGoal, SavingsModel};
use crate::store::{DocumentStore, UserDoc};

use super::{field_patch, ServiceResult};

/// Savings goals for one user.
pub struct SavingsService {
    doc: UserDoc<SavingsModel>,
}

impl SavingsService {
    pub fn open(store: Arc<dyn DocumentStore>, uid: Option<&str>) -> ServiceResult<Self> {
        let path = uid.map(savings_model_path).transpose()?;
        Ok(Self {
            doc: UserDoc::open(store, path, SavingsModel::default()),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.doc.is_ready()
    }

    pub fn model(&self) -> SavingsModel {
        self.doc.data_or_default()
    }

    pub fn goals(&self) -> Vec<SavingsGoal> {
        self.model().goals
    }

    pub fn total_remaining(&self) -> f64 {
        self.model().total_remaining()
    }

    pub fn remaining_by_goal(&self) -> Vec<(String, f64)> {
        self.model().remaining_by_goal()
    }

    /// Commits one cell. Amount cells accept expressions relative to the
    /// current value.
    pub fn edit_cell(&self, row: usize, field: GoalField, raw: &str) -> ServiceResult<SavingsGoal> {
        let mut model = self.model();
        model.edit(row, field, raw)?;
        let goal = model.goals[row].clone();
        self.save(&model)?;
        Ok(goal)
    }

    pub fn add_row(&self) -> ServiceResult<usize> {
        let mut model = self.model();
        model.add_row();
        self.save(&model)?;
        Ok(model.goals.len() - 1)
    }

    pub fn remove_row(&self, row: usize) -> ServiceResult<SavingsGoal> {
        let mut model = self.model();
        let removed = model.remove_row(row)?;
        self.save(&model)?;
        Ok(removed)
    }

    fn save(&self, model: &SavingsModel) -> ServiceResult<()> {
        self.doc.update(field_patch("goals", &model.goals)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn rows_edit_and_total() {
        let savings = SavingsService::open(Arc::new(MemoryStore::new()), Some("u1")).unwrap();
        assert!(savings.goals().is_empty());

        let row = savings.add_row().unwrap();
        savings.edit_cell(row, GoalField::Label, "Holiday").unwrap();
        savings.edit_cell(row, GoalField::Target, "2000").unwrap();
        savings.edit_cell(row, GoalField::Saved, "500").unwrap();
        let goal = savings.edit_cell(row, GoalField::Saved, "+250").unwrap();
        assert_eq!(goal.saved.value(), 750.0);

        let row = savings.add_row().unwrap();
        savings.edit_cell(row, GoalField::Target, "100").unwrap();
        savings.edit_cell(row, GoalField::Saved, "150").unwrap();
        assert_eq!(savings.total_remaining(), 1250.0);
        assert_eq!(savings.remaining_by_goal()[1], (String::new(), 0.0));

        savings.remove_row(0).unwrap();
        assert_eq!(savings.goals().len(), 1);
        assert!(savings.remove_row(5).is_err());
        assert!(savings.edit_cell(3, GoalField::Label, "x").is_err());
    }

    #[test]
    fn bad_amount_entry_keeps_prior() {
        let savings = SavingsService::open(Arc::new(MemoryStore::new()), Some("u1")).unwrap();
        let row = savings.add_row().unwrap();
        savings.edit_cell(row, GoalField::Target, "300").unwrap();
        let goal = savings.edit_cell(row, GoalField::Target, "3/0").unwrap();
        assert_eq!(goal.target.value(), 300.0);
    }
}
