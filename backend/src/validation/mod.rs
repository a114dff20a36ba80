//! Request payload validation: `validator` derives plus the domain rules in [`rules`].

pub mod rules;
