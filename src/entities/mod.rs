pub mod dock_location;
pub mod grn;
pub mod location;
pub mod master_list_item;
pub mod product;
