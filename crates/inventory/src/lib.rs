//! `neurocore-inventory` — inventory catalog records and payload validation.
//!
//! Items, packages, combos and low-stock alerts, plus the immutable
//! [`ItemList`] snapshot used to keep derived views in step with confirmed
//! mutations.

pub mod alert;
pub mod combo;
pub mod item;
pub mod item_list;
pub mod package;
mod validation;

pub use alert::{AlertChannel, InventoryAlert, NewInventoryAlert};
pub use combo::{ComboComponent, ComboHeader, ComboHeaderPatch, ComboRecord, NewCombo, NewComboComponent};
pub use item::{InventoryItem, InventoryItemPatch, ItemType, NewInventoryItem};
pub use item_list::ItemList;
pub use package::{NewPackage, PackageDefinition, PackagePatch};
