// groq-typegen test infrastructure
//
// Unit tests live next to the code they cover; the suites here drive the
// worker, host and watch session end to end against throwaway projects.

pub mod helpers;
