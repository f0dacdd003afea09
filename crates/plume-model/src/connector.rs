//! Connecting line items to the items they link.
//!
//! Binding a handle is recorded in the diagram's connection table. Once both
//! ends of a line are bound, the line's [`Connector`] applies the semantic
//! side effect to the model elements presented by the two items.

mod containment;

pub use containment::ContainmentConnector;

use log::{debug, warn};

use plume_core::identifier::ElementId;

use crate::{
    diagram::{Endpoint, HandleConstraint},
    error::{ModelError, Result},
    event::Property,
    factory::ElementFactory,
    metaclass::Metaclass,
};

/// Connection rules and model side effects of a line type.
pub trait Connector {
    /// Returns `true` if `item` may be bound to `endpoint` of `line`, given
    /// the item bound to the opposite end.
    ///
    /// Generic checks (same diagram, distinct items) are done by the factory
    /// before this is called.
    fn allow(
        &self,
        factory: &ElementFactory,
        line: ElementId,
        endpoint: Endpoint,
        item: ElementId,
        opposite: Option<ElementId>,
    ) -> bool;

    /// Applies the model relation once both ends are bound.
    fn connect_subjects(
        &self,
        factory: &mut ElementFactory,
        line: ElementId,
        head: ElementId,
        tail: ElementId,
    ) -> Result<()>;

    /// Undoes the model relation before `endpoint` is unbound.
    fn disconnect_subjects(
        &self,
        factory: &mut ElementFactory,
        line: ElementId,
        endpoint: Endpoint,
        head: ElementId,
        tail: ElementId,
    ) -> Result<()>;
}

/// Returns the connector for a line type.
pub fn connector_for(metaclass: Metaclass) -> Option<&'static dyn Connector> {
    match metaclass {
        Metaclass::ContainmentItem => Some(&ContainmentConnector),
        _ => None,
    }
}

impl ElementFactory {
    fn connector(&self, line: ElementId) -> Result<&'static dyn Connector> {
        let metaclass = self.element(line)?.metaclass();
        self.presentation(line)?;
        connector_for(metaclass).ok_or(ModelError::NotAConnector(line))
    }

    /// Checks whether `item` can be bound to `endpoint` of `line`.
    ///
    /// Has no side effects. A `false` result is not an error.
    pub fn glue(&self, line: ElementId, endpoint: Endpoint, item: ElementId) -> bool {
        let Ok(connector) = self.connector(line) else {
            return false;
        };
        let opposite = self
            .connected_item(line, endpoint.opposite())
            .ok()
            .flatten();
        self.fits(connector, line, endpoint, item, opposite)
    }

    fn fits(
        &self,
        connector: &dyn Connector,
        line: ElementId,
        endpoint: Endpoint,
        item: ElementId,
        opposite: Option<ElementId>,
    ) -> bool {
        if item == line {
            return false;
        }
        let (Ok(line_data), Ok(item_data)) = (self.presentation(line), self.presentation(item))
        else {
            return false;
        };
        if line_data.diagram() != item_data.diagram() {
            return false;
        }
        connector.allow(self, line, endpoint, item, opposite)
    }

    /// The item bound to `endpoint` of `line`.
    pub fn connected_item(&self, line: ElementId, endpoint: Endpoint) -> Result<Option<ElementId>> {
        let diagram = self.presentation(line)?.diagram();
        Ok(self
            .connections(diagram)?
            .get_connection(line, endpoint)
            .and_then(|connection| connection.connected()))
    }

    /// Binds `endpoint` of `line` to `item`.
    ///
    /// Rebinding an endpoint to another item disconnects it first. When the
    /// opposite end is bound too, the connector updates the model. The
    /// handle is moved to the centre of `item`.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotAConnector`] if `line` is not a connecting item
    /// - [`ModelError::ConnectionRefused`] if [`ElementFactory::glue`] fails
    pub fn connect(&mut self, line: ElementId, endpoint: Endpoint, item: ElementId) -> Result<()> {
        let connector = self.connector(line)?;
        if !self.glue(line, endpoint, item) {
            return Err(ModelError::ConnectionRefused {
                line,
                endpoint,
                item,
            });
        }

        let current = self.connected_item(line, endpoint)?;
        if current == Some(item) {
            return Ok(());
        }
        if current.is_some() {
            self.disconnect(line, endpoint)?;
        }

        let diagram = self.diagram_of(line)?;
        self.diagram_data_mut(diagram)?.connections_mut().connect_item(
            line,
            endpoint,
            item,
            Some(Box::new(HandleConstraint {
                line,
                endpoint,
                item,
            })),
        );

        if let Some(other) = self.connected_item(line, endpoint.opposite())? {
            let (head, tail) = match endpoint {
                Endpoint::Head => (item, other),
                Endpoint::Tail => (other, item),
            };
            if let Err(err) = connector.connect_subjects(self, line, head, tail) {
                self.diagram_data_mut(diagram)?
                    .connections_mut()
                    .disconnect_item(line, endpoint);
                return Err(err);
            }
        }

        self.snap_handle(line, endpoint, item)?;
        debug!(line:?, endpoint:%, item:?; "Handle connected");
        self.notify(line, Property::Connection);
        Ok(())
    }

    /// Unbinds `endpoint` of `line`. Does nothing if it is not bound.
    pub fn disconnect(&mut self, line: ElementId, endpoint: Endpoint) -> Result<()> {
        let connector = self.connector(line)?;
        let Some(item) = self.connected_item(line, endpoint)? else {
            return Ok(());
        };

        if let Some(other) = self.connected_item(line, endpoint.opposite())? {
            let (head, tail) = match endpoint {
                Endpoint::Head => (item, other),
                Endpoint::Tail => (other, item),
            };
            connector.disconnect_subjects(self, line, endpoint, head, tail)?;
        }

        let diagram = self.diagram_of(line)?;
        self.diagram_data_mut(diagram)?
            .connections_mut()
            .disconnect_item(line, endpoint);
        debug!(line:?, endpoint:%, item:?; "Handle disconnected");
        self.notify(line, Property::Connection);
        Ok(())
    }

    /// Restores the bindings of `line` without touching the model.
    ///
    /// This is the reload path for diagrams whose model relations are
    /// already recorded. Each end is checked on its own, as if the other
    /// end were unbound. Ends passed as `None` are unbound. Handles keep
    /// their position.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotAConnector`] if `line` is not a connecting item
    /// - [`ModelError::ConnectionRefused`] if an end does not fit; nothing is
    ///   bound in that case
    pub fn restore_connection(
        &mut self,
        line: ElementId,
        head: Option<ElementId>,
        tail: Option<ElementId>,
    ) -> Result<()> {
        let connector = self.connector(line)?;
        let ends = [(Endpoint::Head, head), (Endpoint::Tail, tail)];
        for (endpoint, item) in ends {
            let Some(item) = item else {
                continue;
            };
            if !self.fits(connector, line, endpoint, item, None) {
                return Err(ModelError::ConnectionRefused {
                    line,
                    endpoint,
                    item,
                });
            }
        }

        let diagram = self.diagram_of(line)?;
        let connections = self.diagram_data_mut(diagram)?.connections_mut();
        for (endpoint, item) in ends {
            match item {
                Some(item) => connections.connect_item(
                    line,
                    endpoint,
                    item,
                    Some(Box::new(HandleConstraint {
                        line,
                        endpoint,
                        item,
                    })),
                ),
                None => {
                    connections.disconnect_item(line, endpoint);
                }
            }
        }
        debug!(line:?, head:?, tail:?; "Connection restored");
        self.notify(line, Property::Connection);
        Ok(())
    }

    /// Applies the model relation of `line` when both of its ends are bound.
    ///
    /// [`ElementFactory::connect`] does this on its own; this is for lines
    /// bound with [`ElementFactory::restore_connection`].
    pub fn connect_subjects(&mut self, line: ElementId) -> Result<()> {
        let connector = self.connector(line)?;
        let (Some(head), Some(tail)) = (
            self.connected_item(line, Endpoint::Head)?,
            self.connected_item(line, Endpoint::Tail)?,
        ) else {
            return Ok(());
        };
        connector.connect_subjects(self, line, head, tail)
    }

    /// Moves every bound handle of `line` onto the centre of its item.
    pub fn snap_handles(&mut self, line: ElementId) -> Result<()> {
        for endpoint in Endpoint::BOTH {
            if let Some(item) = self.connected_item(line, endpoint)? {
                self.snap_handle(line, endpoint, item)?;
            }
        }
        Ok(())
    }

    /// Disconnects the line handles bound to `item` on `diagram`.
    ///
    /// Runs before `item` leaves the registry. Does nothing once the
    /// diagram itself is gone.
    pub(crate) fn detach_lines(&mut self, diagram: ElementId, item: ElementId) {
        let Ok(connections) = self.connections(diagram) else {
            return;
        };
        let bound: Vec<(ElementId, Endpoint)> = connections
            .get_connections(None, Some(item))
            .filter(|connection| connection.item() != item)
            .filter_map(|connection| {
                connection
                    .endpoint()
                    .map(|endpoint| (connection.item(), endpoint))
            })
            .collect();
        for (line, endpoint) in bound {
            if let Err(err) = self.disconnect(line, endpoint) {
                warn!(line:?, endpoint:%, item:?, err:%; "Cannot disconnect line from unlinked item");
            }
        }
    }

    /// Moves a line handle onto the centre of `item`.
    fn snap_handle(&mut self, line: ElementId, endpoint: Endpoint, item: ElementId) -> Result<()> {
        let item_data = self.presentation(item)?;
        let canvas = item_data
            .matrix_i2c()
            .transform_point(item_data.shape().center());

        let line_i2c = self.presentation(line)?.matrix_i2c();
        let position = match line_i2c.invert() {
            Some(inverse) => inverse.transform_point(canvas),
            None => {
                warn!(line:?; "Line transform is not invertible; using canvas position");
                canvas
            }
        };
        self.set_handle_position(line, endpoint, position)
    }
}
