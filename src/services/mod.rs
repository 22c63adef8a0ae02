// Receiving
pub mod grn;
pub mod master_list;

// Storage and stock ledger
pub mod inventory;
pub mod locations;
