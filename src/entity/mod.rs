pub mod audit_logs;
pub mod bag_items;
pub mod bags;
pub mod cart_entries;
pub mod establishments;
pub mod removed_items;
pub mod reservations;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use bag_items::Entity as BagItems;
pub use bags::Entity as Bags;
pub use cart_entries::Entity as CartEntries;
pub use establishments::Entity as Establishments;
pub use removed_items::Entity as RemovedItems;
pub use reservations::Entity as Reservations;
pub use users::Entity as Users;
