/*! Test coverage for the node arena and the guarantees its edits keep.
 *
 * Every pass relies on identities being unique and on parent and child links agreeing. These tests
 * pin down those guarantees at the level of the context and the node model.
 */

mod node_tests;
