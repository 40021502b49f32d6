//! Integration tests over loopback HTTP.

pub mod cluster;

#[cfg(test)]
mod e2e_certification;
#[cfg(test)]
mod flows;
