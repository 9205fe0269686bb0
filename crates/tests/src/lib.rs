pub mod fixtures;

#[cfg(test)]
mod organization_tests;
#[cfg(test)]
mod team_tests;
#[cfg(test)]
mod dependency_tests;
#[cfg(test)]
mod email_tests;
#[cfg(test)]
mod template_tests;
#[cfg(test)]
mod reporting_tests;
