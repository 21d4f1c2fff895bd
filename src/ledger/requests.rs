//! Active leave request list

use crate::traits::*;
use crate::types::*;

/// Request manager for the active leave list
///
/// Requests keep the order they were added in, which is the order the
/// listing shows them.
pub struct RequestManager {
    requests: Vec<LeaveRequest>,
    validator: Box<dyn RequestValidator>,
}

impl Default for RequestManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestManager {
    /// Create a new request manager
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            validator: Box::new(DefaultRequestValidator),
        }
    }

    /// Create a new request manager with custom validator
    pub fn with_validator(validator: Box<dyn RequestValidator>) -> Self {
        Self {
            requests: Vec::new(),
            validator,
        }
    }

    /// Run the configured validator
    pub fn validate(&self, request: &LeaveRequest) -> LeaveResult<()> {
        self.validator.validate_request(request)
    }

    /// Add a request to the list
    pub fn add(&mut self, request: LeaveRequest) -> LeaveResult<()> {
        self.validate(&request)?;

        if self.get(&request.id).is_some() {
            return Err(LeaveError::Validation(format!(
                "Leave request with ID '{}' already exists",
                request.id
            )));
        }

        self.requests.push(request);
        Ok(())
    }

    /// Get a request by ID
    pub fn get(&self, request_id: &str) -> Option<&LeaveRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }

    /// Get a request by ID, returning an error if not found
    pub fn get_required(&self, request_id: &str) -> LeaveResult<&LeaveRequest> {
        self.get(request_id)
            .ok_or_else(|| LeaveError::RequestNotFound(request_id.to_string()))
    }

    /// List all requests
    pub fn list(&self) -> &[LeaveRequest] {
        &self.requests
    }

    /// List requests with the given status
    pub fn by_status(&self, status: LeaveStatus) -> Vec<&LeaveRequest> {
        self.requests.iter().filter(|r| r.status == status).collect()
    }

    /// Replace a request in place, keeping its position
    pub fn replace(&mut self, request: LeaveRequest) -> LeaveResult<()> {
        self.validate(&request)?;

        let slot = self
            .requests
            .iter_mut()
            .find(|r| r.id == request.id)
            .ok_or_else(|| LeaveError::RequestNotFound(request.id.clone()))?;
        *slot = request;
        Ok(())
    }

    /// Remove a request from the list
    pub fn remove(&mut self, request_id: &str) -> LeaveResult<LeaveRequest> {
        let index = self
            .requests
            .iter()
            .position(|r| r.id == request_id)
            .ok_or_else(|| LeaveError::RequestNotFound(request_id.to_string()))?;
        Ok(self.requests.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request(id: &str, status: LeaveStatus) -> LeaveRequest {
        let mut request = LeaveRequest::new(
            id.to_string(),
            "Earned Leave".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            2,
            "Errands".to_string(),
        );
        request.status = status;
        request
    }

    #[test]
    fn test_add_get_remove() {
        let mut manager = RequestManager::new();
        manager.add(request("a", LeaveStatus::Pending)).unwrap();
        manager.add(request("b", LeaveStatus::Approved)).unwrap();

        assert!(manager.add(request("a", LeaveStatus::Saved)).is_err());
        assert_eq!(manager.by_status(LeaveStatus::Approved).len(), 1);

        let removed = manager.remove("a").unwrap();
        assert_eq!(removed.id, "a");
        assert_eq!(
            manager.get_required("a").unwrap_err(),
            LeaveError::RequestNotFound("a".to_string())
        );
    }

    #[test]
    fn test_replace_keeps_order() {
        let mut manager = RequestManager::new();
        manager.add(request("a", LeaveStatus::Pending)).unwrap();
        manager.add(request("b", LeaveStatus::Pending)).unwrap();

        let mut updated = request("a", LeaveStatus::Pending);
        updated.duration = 1;
        manager.replace(updated).unwrap();

        assert_eq!(manager.list()[0].id, "a");
        assert_eq!(manager.list()[0].duration, 1);
        assert!(manager.replace(request("zzz", LeaveStatus::Saved)).is_err());
    }
}
