//! GraphQL documents for the catalog service.
//!
//! The schema is owned by the service; these documents only select the
//! fields the client consumes.

/// Paginated, sorted product listing.
pub(crate) const GET_PRODUCTS: &str = r"
query GetProducts($input: ProductGetManyInput) {
  products {
    getMany(input: $input) {
      pagination {
        pageSize
        pageNumber
        total
      }
      data {
        id
        name
        photo
        desc
        price
        category {
          id
          name
        }
      }
    }
  }
}";

/// Single product detail.
pub(crate) const GET_PRODUCT: &str = r"
query GetProduct($getOneId: ID!) {
  products {
    getOne(id: $getOneId) {
      id
      name
      photo
      desc
      price
      category {
        id
        name
      }
    }
  }
}";

/// Order listing for the ambient session.
pub(crate) const GET_ORDERS: &str = r"
query GetOrders($input: OrderGetManyInput) {
  orders {
    getMany(input: $input) {
      data {
        id
        status
        products {
          product {
            id
          }
          quantity
        }
        user {
          id
        }
      }
    }
  }
}";

/// Create an order from line items.
pub(crate) const ADD_ORDER: &str = r"
mutation AddOrder($input: OrderAddInput!) {
  orders {
    add(input: $input) {
      id
    }
  }
}";

/// Patch an order's status.
pub(crate) const UPDATE_ORDER: &str = r"
mutation UpdateOrder($patchId: ID!, $input: OrderUpdateInput!) {
  orders {
    patch(id: $patchId, input: $input) {
      id
      status
    }
  }
}";

/// Delete an order record.
pub(crate) const REMOVE_ORDER: &str = r"
mutation RemoveOrder($removeId: ID!) {
  orders {
    remove(id: $removeId) {
      id
    }
  }
}";

/// The signed-in user's profile.
pub(crate) const GET_PROFILE: &str = r"
query Profile {
  profile {
    id
    name
    email
    signUpDate
  }
}";

/// Just the profile id, for ownership checks.
pub(crate) const GET_PROFILE_ID: &str = r"
query ProfileId {
  profile {
    id
  }
}";
